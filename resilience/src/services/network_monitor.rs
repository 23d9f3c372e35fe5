//! 网络可用性监视器
//!
//! 职责: 在联网时机会性地把本地队列送往收集端
//! 策略: 纯转换驱动,不轮询
//! - 启动时若已在线,提交一次
//! - 每次 离线→在线 转换,提交一次
//! - 在线→离线 转换不做任何事

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::services::connectivity::ConnectivitySignal;
use crate::services::error_reporter::{ErrorReporter, FlushOutcome};

/// 网络监视器
pub struct NetworkMonitor {
    reporter: Arc<ErrorReporter>,
    rx: watch::Receiver<bool>,
    cancel: CancellationToken,
}

impl NetworkMonitor {
    pub fn new(reporter: Arc<ErrorReporter>, signal: &ConnectivitySignal) -> Self {
        Self {
            reporter,
            rx: signal.subscribe(),
            cancel: CancellationToken::new(),
        }
    }

    /// 取消令牌,用于停止监视任务
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 启动监视任务
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut was_online = *self.rx.borrow_and_update();
        tracing::info!(online = was_online, "网络监视器已启动");

        if was_online {
            self.flush().await;
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("网络监视器已停止");
                    break;
                }
                changed = self.rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("连通性信号已关闭,监视器退出");
                        break;
                    }

                    let online = *self.rx.borrow_and_update();
                    if online && !was_online {
                        self.flush().await;
                    }
                    was_online = online;
                }
            }
        }
    }

    async fn flush(&self) {
        match self.reporter.submit_queued().await {
            Ok(FlushOutcome::Submitted(count)) => {
                tracing::info!(count, "联网后已提交排队的错误记录");
            }
            Ok(FlushOutcome::Empty) => tracing::debug!("本地错误队列为空"),
            Ok(FlushOutcome::InProgress) => tracing::debug!("已有批量提交在进行"),
            // 失败已在上报器内记录,队列保留到下次联网
            Err(e) => tracing::debug!(error = %e, "批量提交未成功,等待下次联网"),
        }
    }
}
