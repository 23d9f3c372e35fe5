use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 本地存储相关错误
///
/// 本地存储是尽力而为的: 这些错误只在存储层与调用方之间传递,
/// 上报器和错误边界会吞掉它们并记录到日志,不会让应用崩溃。
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "error", content = "details")]
pub enum StorageError {
    /// 存储不可用
    ///
    /// 可能原因:
    /// - 数据目录无写权限
    /// - 磁盘已满
    /// - 测试中的故障开关被打开
    #[error("本地存储不可用: {0}")]
    Unavailable(String),

    /// 序列化/反序列化失败
    ///
    /// 存储文件或某个键的值不是合法JSON
    #[error("存储数据序列化失败: {0}")]
    SerializationError(String),
}

/// 错误上报相关错误
///
/// 三类故障对应上报器的三种降级方式:
/// - `StorageUnavailable`: 本地持久化失败,记录日志,不影响调用方
/// - `TransmissionFailed`: 远程提交失败,队列保留,等待下次联网重试
/// - `Malformed`: 调用方传入的既不是字符串也不是异常,强制转为字符串
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "error", content = "details")]
pub enum ReporterError {
    #[error("错误日志本地持久化失败: {0}")]
    StorageUnavailable(String),

    #[error("错误日志远程提交失败: {0}")]
    TransmissionFailed(String),

    #[error("错误输入格式无效,已转为字符串: {0}")]
    Malformed(String),
}

/// 认证相关错误
///
/// 与其他故障不同,认证错误必须展示给用户,不能静默吞掉。
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "error", content = "details")]
pub enum AuthError {
    /// 网络请求失败
    #[error("网络请求失败: {0}")]
    NetworkFailed(String),

    /// 用户名或密码错误 (后端返回401)
    #[error("用户名或密码错误")]
    InvalidCredentials,

    /// 输入缺失,未发出请求
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 后端返回了非预期的状态码
    #[error("HTTP错误 {status}: {message}")]
    HttpStatusError { status: u16, message: String },

    /// 响应格式无效
    #[error("响应格式无效: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// 面向用户展示的提示
    pub fn user_message(&self) -> String {
        match self {
            AuthError::NetworkFailed(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            AuthError::InvalidCredentials => "Invalid username or password".to_string(),
            AuthError::InvalidInput(message) => message.clone(),
            AuthError::HttpStatusError { status, .. } if *status == 429 => {
                "Too many requests. Please try again later.".to_string()
            }
            AuthError::HttpStatusError { message, .. } => message.clone(),
            AuthError::InvalidResponse(_) => {
                "The server returned an unexpected response.".to_string()
            }
        }
    }
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置项 {key} 无效: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("无法确定数据目录,请设置 COACH_DATA_DIR")]
    MissingDataDir,
}

/// 实现从reqwest::Error到AuthError的转换
impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::NetworkFailed("请求超时".to_string())
        } else if err.is_connect() {
            AuthError::NetworkFailed("无法连接到服务器".to_string())
        } else if err.is_decode() {
            AuthError::InvalidResponse(err.to_string())
        } else {
            AuthError::NetworkFailed(err.to_string())
        }
    }
}

/// 实现从reqwest::Error到ReporterError的转换
impl From<reqwest::Error> for ReporterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReporterError::TransmissionFailed("请求超时".to_string())
        } else if err.is_connect() {
            ReporterError::TransmissionFailed("无法连接到服务器".to_string())
        } else {
            ReporterError::TransmissionFailed(err.to_string())
        }
    }
}

impl From<StorageError> for ReporterError {
    fn from(err: StorageError) -> Self {
        ReporterError::StorageUnavailable(err.to_string())
    }
}

/// 实现从serde_json::Error到相关错误的转换
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidResponse(err.to_string())
    }
}

/// 实现从std::io::Error到StorageError的转换
impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                StorageError::Unavailable(format!("Permission denied: {}", err))
            }
            _ => StorageError::Unavailable(format!("I/O error: {}", err)),
        }
    }
}
