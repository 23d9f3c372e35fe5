//! 面试教练客户端的错误恢复与会话状态韧性层
//!
//! 渲染故障 → [`ErrorBoundary`](services::ErrorBoundary) →
//! [`ErrorReporter`](services::ErrorReporter) → 本地队列 (总是) →
//! 远程收集端 (尽力而为,仅在线) → 重新联网时由
//! [`NetworkMonitor`](services::NetworkMonitor) 补交排队记录。

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
