//! 服务层模块
//!
//! - `local_storage`: 本地键值存储 (文件 / 内存)
//! - `error_log_store`: 有界错误日志队列
//! - `error_collector`: 远程收集端 (HTTP)
//! - `error_reporter`: 所有错误的唯一入口
//! - `connectivity` / `network_monitor`: 连通性信号与联网补交
//! - `health_probe`: 以后端健康端点驱动连通性信号
//! - `error_boundary`: 渲染故障隔离
//! - `global_handlers`: 边界之外的panic与异步故障
//! - `auth_backend` / `auth_context`: 会话/认证状态
//! - `config_service`: 配置加载
//!
//! # 服务架构
//!
//! ```text
//!   ErrorBoundary   global_handlers   HttpAuthBackend
//!         │                │                 │
//!         └────────────────┼─────────────────┘
//!                          ▼
//!                   ErrorReporter ──────► ErrorCollector (HTTP)
//!                          │                    ▲
//!                          ▼                    │
//!                   ErrorLogStore        NetworkMonitor ◄── ConnectivitySignal
//!                          │
//!                          ▼
//!                    LocalStorage
//! ```

pub mod auth_backend;
pub mod auth_context;
pub mod config_service;
pub mod connectivity;
pub mod error_boundary;
pub mod error_collector;
pub mod error_log_store;
pub mod error_reporter;
pub mod global_handlers;
pub mod health_probe;
pub mod local_storage;
pub mod network_monitor;

// 重导出常用类型,简化外部引用
pub use auth_backend::{AuthBackend, HttpAuthBackend};
pub use auth_context::AuthContext;
pub use config_service::{AppConfig, BuildProfile, ConfigService};
pub use connectivity::ConnectivitySignal;
pub use error_boundary::{
    BoundaryState, ErrorBoundary, FallbackView, RecoveryAction, Remount, Rendered,
};
pub use error_collector::{ErrorCollector, HttpErrorCollector};
pub use error_log_store::{ErrorLogStore, MAX_LOG_ENTRIES};
pub use error_reporter::{ErrorInput, ErrorReporter, FlushOutcome, ReportHandle};
pub use global_handlers::{install_panic_hook, spawn_guarded};
pub use health_probe::HealthProbe;
pub use local_storage::{FileStorage, LocalStorage, MemoryStorage};
pub use network_monitor::NetworkMonitor;
