use std::future::Future;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::{
    cache::AssetResponse,
    interceptor::{fetch::AssetRequest, pipeline::CacheStatus},
};

/// Inbound events routed by [`AssetInterceptor::dispatch`](super::AssetInterceptor::dispatch)
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    /// Raw control channel payload
    Message(Bytes),
    Fetch(AssetRequest),
}

#[derive(Debug)]
pub enum EventOutcome {
    /// 事件已接收，后台任务可通过 [`ExtendableEvent::settled`] 等待
    Extended(ExtendableEvent),
    /// 由拦截器给出响应
    Respond(AssetResponse, CacheStatus),
    /// 不拦截，交由正常网络处理
    Passthrough(AssetRequest),
}

/// 延长事件生命周期
///
/// 通过 `wait_until` 注册的任务登记在拦截器的 [`TaskTracker`] 上，
/// 关闭时会等待全部任务完成，即使发送方早已收到答复。
#[derive(Debug)]
pub struct ExtendableEvent {
    tracker: TaskTracker,
    pending: Vec<JoinHandle<()>>,
}

impl ExtendableEvent {
    pub(crate) fn new(tracker: TaskTracker) -> Self {
        Self {
            tracker,
            pending: vec![],
        }
    }

    pub fn wait_until<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.push(self.tracker.spawn(task));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// 等待所有登记的任务结束
    pub async fn settled(self) {
        for handle in self.pending {
            if let Err(err) = handle.await {
                warn!("Extended task did not finish: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[tokio::test]
    async fn test_settled_waits_for_tasks() {
        let tracker = TaskTracker::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let mut event = ExtendableEvent::new(tracker.clone());
        for _ in 0..3 {
            let counter = counter.clone();
            event.wait_until(async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(event.pending(), 3);

        event.settled().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_tracker_outlives_dropped_event() {
        let tracker = TaskTracker::new();
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let mut event = ExtendableEvent::new(tracker.clone());
            let counter = counter.clone();
            event.wait_until(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tracker.close();
        tracker.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
