use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::models::{ErrorLogEntry, ReporterError};

/// 单条提交端点
pub const SINGLE_ERROR_PATH: &str = "/api/logs/error";
/// 批量提交端点
pub const BATCH_ERRORS_PATH: &str = "/api/logs/errors/batch";

/// 远程错误收集端
#[async_trait]
pub trait ErrorCollector: Send + Sync {
    /// 提交单条记录,发出即忘,响应被忽略
    async fn submit_one(&self, entry: &ErrorLogEntry) -> Result<(), ReporterError>;

    /// 批量提交,必须明确成功或失败
    async fn submit_batch(&self, entries: &[ErrorLogEntry]) -> Result<(), ReporterError>;
}

#[derive(Serialize)]
struct BatchBody<'a> {
    errors: &'a [ErrorLogEntry],
}

/// 基于HTTP的收集端
pub struct HttpErrorCollector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpErrorCollector {
    /// # 参数
    /// - `base_url`: 后端地址,如 `http://localhost:5000`
    /// - `timeout`: 单次请求超时
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ReporterError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        tracing::info!(base_url = %base_url, "错误收集端客户端已初始化");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ErrorCollector for HttpErrorCollector {
    async fn submit_one(&self, entry: &ErrorLogEntry) -> Result<(), ReporterError> {
        self.client
            .post(self.url(SINGLE_ERROR_PATH))
            .json(entry)
            .send()
            .await?;
        Ok(())
    }

    async fn submit_batch(&self, entries: &[ErrorLogEntry]) -> Result<(), ReporterError> {
        let response = self
            .client
            .post(self.url(BATCH_ERRORS_PATH))
            .json(&BatchBody { errors: entries })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReporterError::TransmissionFailed(format!(
                "收集端返回状态码 {}",
                status.as_u16()
            )));
        }

        tracing::debug!(count = entries.len(), "批量提交成功");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorContext, Severity};

    #[test]
    fn test_batch_body_shape() {
        let entries = vec![ErrorLogEntry::new(
            "boom",
            Severity::Error,
            ErrorContext::new(),
            None,
        )];
        let json = serde_json::to_value(BatchBody { errors: &entries }).unwrap();
        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
        assert_eq!(json["errors"][0]["message"], "boom");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let collector =
            HttpErrorCollector::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            collector.url(BATCH_ERRORS_PATH),
            "http://localhost:5000/api/logs/errors/batch"
        );
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_transmission_failure() {
        // 端口1上不会有服务监听
        let collector =
            HttpErrorCollector::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let result = collector.submit_batch(&[]).await;
        assert!(matches!(result, Err(ReporterError::TransmissionFailed(_))));
    }
}
