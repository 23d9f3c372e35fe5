//! 错误日志记录模型
//!
//! 定义错误记录的数据结构,用于在本地持久化并传输到远程收集端。
//! 记录创建后不可变: 存储只做追加与淘汰,从不修改已有记录。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::time_utils;

/// 错误严重程度
///
/// 全序: Info < Warning < Error < Critical,用于过滤和展示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("未知的严重程度: {}", other)),
        }
    }
}

/// 错误上下文
///
/// 所有字段可选。`url` 由上报器在创建记录时合并进来。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// 任意附加数据
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_data: serde_json::Map<String, serde_json::Value>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.additional_data.insert(key.into(), value);
        self
    }
}

/// 错误日志记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// 唯一标识,收集端可据此对单条提交与批量提交去重
    ///
    /// 旧格式记录没有该字段,解码时补发新id。
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// ISO-8601 创建时间
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub context: ErrorContext,
    /// 仅当触发故障带有堆栈时存在
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorLogEntry {
    /// 以当前时间创建记录
    pub fn new(
        message: impl Into<String>,
        severity: Severity,
        context: ErrorContext,
        stack: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: time_utils::now_iso8601(),
            message: message.into(),
            severity,
            context,
            stack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("Critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_context_uses_camel_case_keys() {
        let context = ErrorContext::new()
            .with_component("Dashboard")
            .with_user_id("42")
            .with_data("sessionId", serde_json::json!(7));

        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["component"], "Dashboard");
        assert_eq!(json["userId"], "42");
        assert_eq!(json["additionalData"]["sessionId"], 7);
        assert!(json.get("action").is_none());
    }

    #[test]
    fn test_entry_without_stack_omits_field() {
        let entry = ErrorLogEntry::new("boom", Severity::Error, ErrorContext::new(), None);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("stack").is_none());
        assert_eq!(json["severity"], "error");
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
