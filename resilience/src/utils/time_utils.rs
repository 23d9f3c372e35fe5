use chrono::{DateTime, SecondsFormat, Utc};

/// 当前时间的 ISO-8601 字符串
///
/// 毫秒精度,UTC,以 `Z` 结尾。例: 2025-10-07T12:34:56.789Z
pub fn now_iso8601() -> String {
    format_iso8601(Utc::now())
}

/// 格式化为 ISO-8601 字符串
pub fn format_iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
