use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use url::Url;

use crate::{
    cache::{AssetResponse, CacheStorage},
    consts::CACHE_NAME,
    error::Result,
};

pub mod classifier;
pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod pipeline;

pub use classifier::{AssetClassifier, TrackedAsset};
pub use events::{Event, EventOutcome, ExtendableEvent};
pub use fetch::{AssetRequest, Fetcher, ReqwestFetcher};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use message::ControlMessage;
pub use pipeline::CacheStatus;

/// 资源拦截器
///
/// 持有缓存仓库句柄、网络请求实现以及生命周期状态，
/// 将每个入站事件分发给对应的处理函数。
pub struct AssetInterceptor {
    storage: Arc<CacheStorage>,
    cache_name: String,
    classifier: AssetClassifier,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Arc<Lifecycle>,
    tracker: TaskTracker,
}

impl AssetInterceptor {
    pub fn new(storage: Arc<CacheStorage>, fetcher: Arc<dyn Fetcher>, origin: &Url) -> Self {
        Self {
            storage,
            cache_name: CACHE_NAME.to_string(),
            classifier: AssetClassifier::new(origin),
            fetcher,
            lifecycle: Arc::new(Lifecycle::new()),
            tracker: TaskTracker::new(),
        }
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// 将事件路由到对应的处理函数
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome> {
        match event {
            Event::Install => self.on_install().map(EventOutcome::Extended),
            Event::Activate => self.on_activate().map(EventOutcome::Extended),
            Event::Message(payload) => Ok(EventOutcome::Extended(self.on_message(payload))),
            Event::Fetch(request) => self.on_fetch(request).await,
        }
    }

    /// 安装后立即跳过等待期
    fn on_install(&self) -> Result<ExtendableEvent> {
        self.lifecycle.begin_install()?;
        self.lifecycle.skip_waiting();
        self.lifecycle.finish_install()?;
        info!("Interceptor installed");
        Ok(ExtendableEvent::new(self.tracker.clone()))
    }

    /// 激活并接管当前所有页面
    fn on_activate(&self) -> Result<ExtendableEvent> {
        self.lifecycle.begin_activate()?;
        let mut event = ExtendableEvent::new(self.tracker.clone());
        let lifecycle = self.lifecycle.clone();
        event.wait_until(async move {
            lifecycle.claim();
        });
        self.lifecycle.finish_activate()?;
        info!("Interceptor activated");
        Ok(event)
    }

    /// 控制消息。无法识别的消息静默忽略。
    fn on_message(&self, payload: Bytes) -> ExtendableEvent {
        let mut event = ExtendableEvent::new(self.tracker.clone());
        if let Some(ControlMessage::ClearCache) = ControlMessage::parse(&payload) {
            let storage = self.storage.clone();
            let cache_name = self.cache_name.clone();
            event.wait_until(async move {
                let existed = storage.delete(&cache_name).await;
                info!("Cache {cache_name} cleared (existed: {existed})");
            });
        }
        event
    }

    async fn on_fetch(&self, request: AssetRequest) -> Result<EventOutcome> {
        if request.method != Method::GET {
            return Ok(EventOutcome::Passthrough(request));
        }
        let Some(asset) = self.classifier.classify(&request.url) else {
            return Ok(EventOutcome::Passthrough(request));
        };
        if !self.lifecycle.controls(request.client_id.as_deref()) {
            debug!("not controlling {}", request.url);
            return Ok(EventOutcome::Passthrough(request));
        }

        debug!("intercept {:?} {}", asset, request.url);
        let cache = self.storage.open(&self.cache_name).await;
        let (response, status) =
            pipeline::cache_first(&cache, self.fetcher.as_ref(), &request).await?;
        debug!("{} {}", status.as_str(), request.url);
        Ok(EventOutcome::Respond(response, status))
    }

    /// Install then activate
    pub async fn start(&self) -> Result<()> {
        for event in [Event::Install, Event::Activate] {
            if let EventOutcome::Extended(event) = self.dispatch(event).await? {
                event.settled().await;
            }
        }
        Ok(())
    }

    /// 停止拦截，并等待所有 `wait_until` 任务完成
    pub async fn shutdown(&self) {
        self.lifecycle.retire();
        self.tracker.close();
        self.tracker.wait().await;
        info!("Interceptor stopped");
    }

    /// 直接返回拦截结果，未拦截时为 `None`
    pub async fn intercept(&self, request: AssetRequest) -> Result<Option<AssetResponse>> {
        match self.dispatch(Event::Fetch(request)).await? {
            EventOutcome::Respond(response, _) => Ok(Some(response)),
            _ => Ok(None),
        }
    }
}
