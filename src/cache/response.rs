use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};

/// 响应类型，对应浏览器中 `Response.type` 的含义
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// 同源响应
    #[default]
    Basic,
    /// 允许读取的跨域响应
    Cors,
    /// 无法读取 body 与 header 的跨域响应
    Opaque,
}

/// An HTTP response as seen by the interceptor and held by the cache store.
///
/// Bodies are fully buffered. Cloning shares the underlying bytes, so a
/// clone is the cheap duplicate stored next to the response handed back
/// to the page.
#[derive(Clone, Debug)]
pub struct AssetResponse {
    pub url: String,
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub kind: ResponseKind,
}

impl AssetResponse {
    pub fn new(url: impl Into<String>, status: StatusCode) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: HeaderMap::new(),
            body: None,
            kind: ResponseKind::Basic,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: http::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// 2xx
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == ResponseKind::Opaque
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map(Bytes::len).unwrap_or_default()
    }
}
