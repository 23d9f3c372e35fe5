//! 错误上报器
//!
//! 系统中所有错误的唯一入口,决定"仅本地"还是"本地+远程"持久化:
//!
//! ```text
//! report() ──► ErrorLogStore (总是, 同步)
//!    │
//!    └──► ErrorCollector::submit_one (仅生产环境且在线, 异步, 发出即忘)
//!
//! submit_queued() ──► ErrorCollector::submit_batch ──成功──► 删除已提交记录
//!                                                  └─失败──► 队列原样保留
//! ```
//!
//! 任何存储或传输故障都在这里被吞掉并写入 tracing 日志,从不传播给调用方。

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;

use crate::models::{ErrorContext, ErrorLogEntry, ReporterError, Severity};
use crate::services::config_service::BuildProfile;
use crate::services::connectivity::ConnectivitySignal;
use crate::services::error_collector::ErrorCollector;
use crate::services::error_log_store::ErrorLogStore;

/// 上报输入
///
/// 对应"字符串或异常值",其余形状一律强制转为字符串。
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorInput {
    Message(String),
    Exception {
        message: String,
        stack: Option<String>,
    },
    Other(serde_json::Value),
}

impl ErrorInput {
    /// 从任意错误类型构造,错误链拼接进消息
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ErrorInput::Exception {
            message,
            stack: None,
        }
    }

    /// 规范化为 (message, stack)
    fn normalize(self) -> (String, Option<String>) {
        match self {
            ErrorInput::Message(message) => (message, None),
            ErrorInput::Exception { message, stack } => (message, stack),
            ErrorInput::Other(value) => {
                let coerced = match value {
                    serde_json::Value::Null => "null".to_string(),
                    other => other.to_string(),
                };
                tracing::debug!(
                    error = %ReporterError::Malformed(coerced.clone()),
                    "上报输入不是字符串或异常"
                );
                (coerced, None)
            }
        }
    }
}

impl From<&str> for ErrorInput {
    fn from(message: &str) -> Self {
        ErrorInput::Message(message.to_string())
    }
}

impl From<String> for ErrorInput {
    fn from(message: String) -> Self {
        ErrorInput::Message(message)
    }
}

impl From<serde_json::Value> for ErrorInput {
    /// 带 `message` 字段的对象视为异常值,其 `stack` 字段(若为字符串)作为堆栈
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(message) => ErrorInput::Message(message),
            serde_json::Value::Object(map) => {
                let message = map.get("message").and_then(|m| m.as_str()).map(str::to_string);
                match message {
                    Some(message) => ErrorInput::Exception {
                        message,
                        stack: map.get("stack").and_then(|s| s.as_str()).map(str::to_string),
                    },
                    None => ErrorInput::Other(serde_json::Value::Object(map)),
                }
            }
            other => ErrorInput::Other(other),
        }
    }
}

/// `report()` 的结果
pub struct ReportHandle {
    pub entry: ErrorLogEntry,
    /// 本地写入是否成功
    pub persisted: bool,
    /// 单条远程提交任务 (未发起时为 None)
    pub submission: Option<JoinHandle<()>>,
}

impl fmt::Debug for ReportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportHandle")
            .field("entry", &self.entry.id)
            .field("persisted", &self.persisted)
            .field("submission", &self.submission.is_some())
            .finish()
    }
}

/// 批量提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// 队列为空,未发起网络请求
    Empty,
    /// 已提交并从队列中删除的记录数
    Submitted(usize),
    /// 另一次批量提交正在进行
    InProgress,
}

/// 错误上报器
pub struct ErrorReporter {
    store: ErrorLogStore,
    collector: Arc<dyn ErrorCollector>,
    connectivity: ConnectivitySignal,
    profile: BuildProfile,
    current_url: RwLock<Option<String>>,
    flush_lock: tokio::sync::Mutex<()>,
}

impl ErrorReporter {
    pub fn new(
        store: ErrorLogStore,
        collector: Arc<dyn ErrorCollector>,
        connectivity: ConnectivitySignal,
        profile: BuildProfile,
    ) -> Self {
        Self {
            store,
            collector,
            connectivity,
            profile,
            current_url: RwLock::new(None),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn profile(&self) -> BuildProfile {
        self.profile
    }

    /// 记录当前页面地址,之后的记录会合并进上下文
    pub fn set_current_url(&self, url: impl Into<String>) {
        if let Ok(mut guard) = self.current_url.write() {
            *guard = Some(url.into());
        }
    }

    pub fn current_url(&self) -> Option<String> {
        self.current_url.read().ok().and_then(|guard| guard.clone())
    }

    /// 上报一个错误
    ///
    /// 同步写入本地队列;生产环境且在线时再异步发起单条提交。
    /// 永不失败: 存储和传输故障只记录日志。
    pub fn report(
        &self,
        error: impl Into<ErrorInput>,
        severity: Severity,
        mut context: ErrorContext,
    ) -> ReportHandle {
        let (message, stack) = error.into().normalize();

        if context.url.is_none() {
            context.url = self.current_url();
        }

        let entry = ErrorLogEntry::new(message, severity, context, stack);

        let persisted = match self.store.append(entry.clone()) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    error = %ReporterError::from(e),
                    entry_id = %entry.id,
                    "错误记录未能写入本地队列"
                );
                false
            }
        };

        tracing::debug!(
            entry_id = %entry.id,
            severity = %entry.severity,
            action = ?entry.context.action,
            "错误已记录"
        );

        let submission = self.spawn_single_submission(&entry);

        ReportHandle {
            entry,
            persisted,
            submission,
        }
    }

    fn spawn_single_submission(&self, entry: &ErrorLogEntry) -> Option<JoinHandle<()>> {
        if !self.profile.is_production() || !self.connectivity.is_online() {
            return None;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(entry_id = %entry.id, "无异步运行时,跳过单条提交");
            return None;
        };

        let collector = Arc::clone(&self.collector);
        let entry = entry.clone();
        Some(runtime.spawn(async move {
            // 单条提交失败不重试,由批量提交兜底
            if let Err(e) = collector.submit_one(&entry).await {
                tracing::warn!(error = %e, entry_id = %entry.id, "单条错误提交失败");
            }
        }))
    }

    /// 批量提交本地队列
    ///
    /// 调用方负责在调用前确认网络可用。
    /// 成功时删除已提交的记录;失败时队列原样保留,等待下次联网。
    pub async fn submit_queued(&self) -> Result<FlushOutcome, ReporterError> {
        let Ok(_guard) = self.flush_lock.try_lock() else {
            tracing::debug!("批量提交进行中,跳过本次触发");
            return Ok(FlushOutcome::InProgress);
        };

        let entries = self.store.entries()?;
        if entries.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        if let Err(e) = self.collector.submit_batch(&entries).await {
            tracing::warn!(error = %e, queued = entries.len(), "批量提交失败,保留队列");
            return Err(e);
        }

        let ids: HashSet<_> = entries.iter().map(|entry| entry.id).collect();
        let removed = self.store.remove_submitted(&ids)?;

        tracing::info!(submitted = entries.len(), removed, "本地错误队列已提交");
        Ok(FlushOutcome::Submitted(entries.len()))
    }

    /// 当前排队的记录 (诊断用)
    pub fn queued(&self) -> Result<Vec<ErrorLogEntry>, ReporterError> {
        Ok(self.store.entries()?)
    }

    /// 按严重程度过滤排队记录 (诊断用)
    pub fn queued_at_least(&self, min: Severity) -> Result<Vec<ErrorLogEntry>, ReporterError> {
        Ok(self.store.entries_at_least(min)?)
    }
}
