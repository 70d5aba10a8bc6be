//! Cache first response pipeline for tracked assets.

use http::{HeaderValue, Response, header::CONTENT_TYPE};
use tracing::{debug, info};
use url::Url;

use crate::{
    cache::{AssetResponse, Cache, MatchOptions},
    consts::{WASM_CONTENT_TYPE, WASM_EXTENSION},
    error::Result,
    interceptor::fetch::{AssetRequest, Fetcher},
};

/// How a tracked request was answered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// 直接由缓存返回
    Hit,
    /// 请求网络并写入缓存
    Miss,
    /// 请求网络但响应不可缓存
    Skip,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Skip => "SKIP",
        }
    }
}

/// 先查缓存，未命中时请求网络并写入缓存
///
/// 1. 以忽略查询参数的方式查找缓存，命中直接返回
/// 2. 未命中则请求网络，网络错误直接返回给调用方
/// 3. 非 2xx 响应原样返回，不写入缓存
/// 4. wasm 资源强制设置 `Content-Type: application/wasm` 后写入缓存
/// 5. 其余成功响应写入一份副本后原样返回
pub async fn cache_first(
    cache: &Cache,
    fetcher: &dyn Fetcher,
    request: &AssetRequest,
) -> Result<(AssetResponse, CacheStatus)> {
    let options = MatchOptions {
        ignore_search: true,
    };
    if let Some(cached) = cache.match_request(&request.url, options) {
        debug!("cache hit {}", request.url);
        return Ok((cached, CacheStatus::Hit));
    }

    debug!("cache miss {}", request.url);
    let response = fetcher.fetch(request).await?;
    if !response.ok() {
        info!("Skip caching {} with status {}", request.url, response.status);
        return Ok((response, CacheStatus::Skip));
    }

    if is_wasm_request(&request.url) && response.body.is_some() && !response.is_opaque() {
        // 修正失败时回退到原始响应
        if let Ok(fixed) = with_wasm_content_type(&response) {
            debug!("store wasm {} ({} bytes)", request.url, fixed.body_len());
            cache.put(&request.url, fixed.clone()).await;
            return Ok((fixed, CacheStatus::Miss));
        }
    }

    debug!("store {} ({} bytes)", request.url, response.body_len());
    cache.put(&request.url, response.clone()).await;
    Ok((response, CacheStatus::Miss))
}

fn is_wasm_request(request_url: &str) -> bool {
    Url::parse(request_url)
        .map(|url| url.path().ends_with(WASM_EXTENSION))
        .unwrap_or(false)
}

/// 重新构造响应，保持状态码、状态文本与 body 不变，仅覆盖 `Content-Type`
pub fn with_wasm_content_type(response: &AssetResponse) -> Result<AssetResponse> {
    let mut builder = Response::builder().status(response.status);
    for (name, value) in response.headers.iter() {
        if *name != CONTENT_TYPE {
            builder = builder.header(name, value);
        }
    }
    let rebuilt = builder
        .header(CONTENT_TYPE, HeaderValue::from_static(WASM_CONTENT_TYPE))
        .body(response.body.clone())?;

    let (parts, body) = rebuilt.into_parts();
    Ok(AssetResponse {
        url: response.url.clone(),
        status: parts.status,
        status_text: response.status_text.clone(),
        headers: parts.headers,
        body,
        kind: response.kind,
    })
}
