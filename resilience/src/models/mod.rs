//! 数据模型模块
//!
//! 包含所有核心数据结构:
//! - errors: 错误类型定义 (存储、上报、认证、配置)
//! - error_log_entry: 错误日志记录 (本地队列与远程收集端共用的格式)
//! - auth: 认证接口的请求/响应与用户资料

pub mod auth;
pub mod error_log_entry;
pub mod errors;

// 重导出常用类型,简化外部引用
pub use auth::{AuthCheckResponse, Credentials, LoginResponse, UserProfile};
pub use error_log_entry::{ErrorContext, ErrorLogEntry, Severity};
pub use errors::{AuthError, ConfigError, ReporterError, StorageError};
