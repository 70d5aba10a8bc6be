use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{
    HeaderMap, Method,
    header::{ACCEPT_ENCODING, CONTENT_LENGTH},
};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{
    cache::{AssetResponse, ResponseKind},
    error::{Error, Result},
    utils::headers::copy_headers,
};

/// A request observed by the interceptor
#[derive(Clone, Debug)]
pub struct AssetRequest {
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Page that issued the request
    pub client_id: Option<String>,
}

impl AssetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_id: None,
        }
    }
}

/// 真实的网络请求
///
/// 网络错误原样向上返回，不做重试。
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse>;
}

/// reqwest 实现，同源请求会被改写到配置的上游地址
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: Client,
    origin: Url,
    upstream: Option<Url>,
    timeout: Duration,
}

impl ReqwestFetcher {
    pub fn new(origin: Url, upstream: Option<Url>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            origin,
            upstream,
            timeout,
        })
    }

    /// 计算实际请求的地址
    ///
    /// 跨域请求原样发出。同源请求必须改写到上游，
    /// 未配置上游时返回错误，否则请求会回到拦截器自身。
    pub fn network_url(&self, request_url: &str) -> Result<Url> {
        let url = Url::parse(request_url)?;
        if url.origin() != self.origin.origin() {
            return Ok(url);
        }
        let Some(upstream) = &self.upstream else {
            return Err(Error::Config(format!(
                "no upstream configured for same-origin request {url}"
            )));
        };

        let mut target = upstream.clone();
        let base = upstream.path().trim_end_matches('/');
        target.set_path(&format!("{base}{}", url.path()));
        target.set_query(url.query());
        Ok(target)
    }

    fn response_kind(&self, request_url: &Url) -> ResponseKind {
        if request_url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
        let request_url = Url::parse(&request.url)?;
        let target = self.network_url(&request.url)?;
        debug!("fetch {} {} via {}", request.method, request.url, target);

        let mut headers = HeaderMap::new();
        copy_headers(&request.headers, &mut headers);
        // 编码与长度交由 reqwest 处理
        headers.remove(ACCEPT_ENCODING);
        headers.remove(CONTENT_LENGTH);
        let mut builder = self
            .client
            .request(request.method.clone(), target)
            .timeout(self.timeout)
            .headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let res = builder.send().await?;
        let status = res.status();
        let mut response = AssetResponse::new(request.url.clone(), status)
            .with_kind(self.response_kind(&request_url));
        copy_headers(res.headers(), &mut response.headers);
        let body = res.bytes().await?;
        if request.method != Method::HEAD {
            response.body = Some(body);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(upstream: Option<&str>) -> ReqwestFetcher {
        ReqwestFetcher::new(
            Url::parse("http://127.0.0.1:8080").unwrap(),
            upstream.map(|u| Url::parse(u).unwrap()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_network_url_without_upstream() {
        let f = fetcher(None);
        assert!(matches!(
            f.network_url("http://127.0.0.1:8080/pnnx.js"),
            Err(Error::Config(_))
        ));
        assert!(f.network_url("http://127.0.0.1:8080/index.html").is_err());
        // 跨域请求不受影响
        assert_eq!(
            f.network_url(crate::consts::CDN_JS).unwrap().as_str(),
            crate::consts::CDN_JS
        );
    }

    #[tokio::test]
    async fn test_fetch_without_upstream_fails_fast() {
        let f = fetcher(None);
        let started = std::time::Instant::now();
        let res = f.fetch(&AssetRequest::get("http://127.0.0.1:8080/pnnx.js")).await;
        assert!(matches!(res, Err(Error::Config(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_network_url_rewrites_same_origin() {
        let f = fetcher(Some("http://10.0.0.2:3000/base/"));
        assert_eq!(
            f.network_url("http://127.0.0.1:8080/models/pnnx.wasm?v=1")
                .unwrap()
                .as_str(),
            "http://10.0.0.2:3000/base/models/pnnx.wasm?v=1"
        );
    }

    #[test]
    fn test_network_url_keeps_cross_origin() {
        let f = fetcher(Some("http://10.0.0.2:3000"));
        assert_eq!(
            f.network_url(crate::consts::CDN_WASM).unwrap().as_str(),
            crate::consts::CDN_WASM
        );
    }

    #[test]
    fn test_response_kind() {
        let f = fetcher(None);
        let same = Url::parse("http://127.0.0.1:8080/pnnx.js").unwrap();
        let cross = Url::parse(crate::consts::CDN_JS).unwrap();
        assert_eq!(f.response_kind(&same), ResponseKind::Basic);
        assert_eq!(f.response_kind(&cross), ResponseKind::Cors);
    }
}
