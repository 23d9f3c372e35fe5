//! 测试公共模块
//!
//! 提供Mock收集端、Mock认证后端和装配工具,避免外部依赖。
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use coach_resilience::models::{
    AuthCheckResponse, AuthError, Credentials, ErrorLogEntry, LoginResponse, ReporterError,
    UserProfile,
};
use coach_resilience::services::{
    AuthBackend, BuildProfile, ConnectivitySignal, ErrorCollector, ErrorLogStore, ErrorReporter,
    MemoryStorage,
};

/// Mock收集端
///
/// 记录每次单条与批量提交,支持失败模式。
#[derive(Default)]
pub struct MockCollector {
    pub singles: Mutex<Vec<ErrorLogEntry>>,
    pub batches: Mutex<Vec<Vec<ErrorLogEntry>>>,
    should_fail: AtomicBool,
}

impl MockCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置失败模式 (模拟收集端不可用)
    pub fn set_fail_mode(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn single_count(&self) -> usize {
        self.singles.lock().unwrap().len()
    }
}

#[async_trait]
impl ErrorCollector for MockCollector {
    async fn submit_one(&self, entry: &ErrorLogEntry) -> Result<(), ReporterError> {
        self.singles.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn submit_batch(&self, entries: &[ErrorLogEntry]) -> Result<(), ReporterError> {
        self.batches.lock().unwrap().push(entries.to_vec());
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ReporterError::TransmissionFailed("模拟的收集端故障".to_string()));
        }
        Ok(())
    }
}

/// 阻塞在批量提交中的收集端
///
/// `submit_batch` 进入后通知 `entered`,直到 `release` 被通知才返回成功。
#[derive(Default)]
pub struct GatedCollector {
    pub entered: tokio::sync::Notify,
    pub release: tokio::sync::Notify,
    pub batches: Mutex<Vec<Vec<ErrorLogEntry>>>,
}

#[async_trait]
impl ErrorCollector for GatedCollector {
    async fn submit_one(&self, _entry: &ErrorLogEntry) -> Result<(), ReporterError> {
        Ok(())
    }

    async fn submit_batch(&self, entries: &[ErrorLogEntry]) -> Result<(), ReporterError> {
        self.batches.lock().unwrap().push(entries.to_vec());
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// 装配好的上报器
pub struct Harness {
    pub storage: Arc<MemoryStorage>,
    pub collector: Arc<MockCollector>,
    pub signal: ConnectivitySignal,
    pub reporter: Arc<ErrorReporter>,
}

impl Harness {
    pub fn new(profile: BuildProfile, online: bool) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let collector = Arc::new(MockCollector::new());
        let signal = ConnectivitySignal::new(online);
        let reporter = Arc::new(ErrorReporter::new(
            ErrorLogStore::new(storage.clone()),
            collector.clone(),
            signal.clone(),
            profile,
        ));
        Self {
            storage,
            collector,
            signal,
            reporter,
        }
    }
}

/// 轮询等待条件成立,超时返回false
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Mock认证后端
pub struct MockAuthBackend {
    pub check_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    check_result: Mutex<Result<AuthCheckResponse, AuthError>>,
    login_error: Mutex<Option<AuthError>>,
    logout_error: Mutex<Option<AuthError>>,
}

impl MockAuthBackend {
    /// 校验返回"未认证"
    pub fn new() -> Self {
        Self {
            check_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            check_result: Mutex::new(Ok(AuthCheckResponse {
                authenticated: false,
                user: None,
            })),
            login_error: Mutex::new(None),
            logout_error: Mutex::new(None),
        }
    }

    pub fn with_check_result(self, result: Result<AuthCheckResponse, AuthError>) -> Self {
        *self.check_result.lock().unwrap() = result;
        self
    }

    pub fn with_login_error(self, error: AuthError) -> Self {
        *self.login_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_logout_error(self, error: AuthError) -> Self {
        *self.logout_error.lock().unwrap() = Some(error);
        self
    }

    pub fn checks(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }
}

pub fn profile(id: i64, username: &str) -> UserProfile {
    UserProfile {
        id,
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn check(&self) -> Result<AuthCheckResponse, AuthError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.check_result.lock().unwrap().clone()
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.login_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(LoginResponse {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            user: profile(1, &credentials.username),
        })
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
