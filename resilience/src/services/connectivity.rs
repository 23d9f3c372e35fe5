use std::sync::Arc;
use tokio::sync::watch;

/// 网络连通性信号
///
/// 相当于浏览器的 online/offline 事件源。
/// 只有状态真正变化时才通知订阅者,重复设置同一状态不会产生转换。
#[derive(Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivitySignal {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// 更新连通状态
    ///
    /// # 返回值
    /// 状态是否发生了变化
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            tracing::info!(online, "网络连通性发生变化");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_same_state_is_not_a_transition() {
        let signal = ConnectivitySignal::new(false);
        assert!(!signal.set_online(false));
        assert!(signal.set_online(true));
        assert!(!signal.set_online(true));
        assert!(signal.is_online());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let signal = ConnectivitySignal::new(false);
        let mut rx = signal.subscribe();

        signal.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = ConnectivitySignal::new(true);
        let other = signal.clone();
        other.set_online(false);
        assert!(!signal.is_online());
    }
}
