use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::services::connectivity::ConnectivitySignal;

/// 后端健康检查端点
pub const HEALTH_PATH: &str = "/api/health";

/// 健康探测
///
/// 在没有浏览器连通性事件的进程里充当事件源:
/// 定期请求后端健康端点,把结果写入 [`ConnectivitySignal`]。
/// 监视器只订阅信号的转换,自身不轮询。
pub struct HealthProbe {
    client: reqwest::Client,
    url: String,
    interval: Duration,
    signal: ConnectivitySignal,
}

impl HealthProbe {
    pub fn new(
        base_url: &str,
        interval: Duration,
        timeout: Duration,
        signal: ConnectivitySignal,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), HEALTH_PATH),
            interval,
            signal,
        })
    }

    /// 探测一次,返回后端是否可达
    pub async fn probe_once(&self) -> bool {
        let online = match self.client.get(&self.url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "健康检查失败");
                false
            }
        };
        self.signal.set_online(online);
        online
    }

    /// 持续探测直到取消
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.probe_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_backend_marks_offline() {
        let signal = ConnectivitySignal::new(true);
        let probe = HealthProbe::new(
            "http://127.0.0.1:1",
            Duration::from_secs(60),
            Duration::from_secs(2),
            signal.clone(),
        )
        .unwrap();

        assert!(!probe.probe_once().await);
        assert!(!signal.is_online());
    }
}
