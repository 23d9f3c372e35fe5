use std::sync::Arc;

use crate::models::ReporterError;
use crate::services::{
    AppConfig, ConnectivitySignal, ErrorLogStore, ErrorReporter, FileStorage, HttpAuthBackend,
    HttpErrorCollector, LocalStorage,
};

/// 应用全局状态
///
/// 每个字段代表韧性层的一项核心能力:
/// - storage: 本地持久化
/// - connectivity: 连通性信号
/// - reporter: 错误上报的唯一入口
/// - auth_backend: 认证接口 (网络失败经由 reporter 上报)
///
/// 认证上下文需要异步启动,由调用方通过 `AuthContext::bootstrap` 单独创建。
pub struct AppState {
    pub config: AppConfig,
    pub storage: Arc<dyn LocalStorage>,
    pub connectivity: ConnectivitySignal,
    pub reporter: Arc<ErrorReporter>,
    pub auth_backend: Arc<HttpAuthBackend>,
}

impl AppState {
    /// 初始化应用状态
    ///
    /// # 参数
    /// - `initially_online`: 启动时的连通状态
    ///
    /// # 错误处理
    /// 数据目录不可写或HTTP客户端无法创建时返回错误
    pub fn new(config: AppConfig, initially_online: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::open(&config.data_dir)?);
        let connectivity = ConnectivitySignal::new(initially_online);

        let collector = Arc::new(HttpErrorCollector::new(
            &config.api_base_url,
            config.request_timeout,
        )?);

        let reporter = Arc::new(ErrorReporter::new(
            ErrorLogStore::new(Arc::clone(&storage)),
            collector,
            connectivity.clone(),
            config.profile,
        ));

        let auth_backend = Arc::new(
            HttpAuthBackend::new(&config.api_base_url, config.request_timeout)?
                .with_reporter(Arc::clone(&reporter)),
        );

        tracing::info!(
            api_base_url = %config.api_base_url,
            profile = ?config.profile,
            data_dir = %config.data_dir.display(),
            "AppState initialized"
        );

        Ok(Self {
            config,
            storage,
            connectivity,
            reporter,
            auth_backend,
        })
    }

    /// 当前排队的错误数
    pub fn queued_errors(&self) -> Result<usize, ReporterError> {
        Ok(self.reporter.queued()?.len())
    }
}
