use url::{Origin, Url};

use crate::consts::{CDN_JS, CDN_WASM, JS_SUFFIX, WASM_SUFFIX};

/// The two assets the interceptor caches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackedAsset {
    Script,
    Wasm,
}

/// 判断请求是否属于需要缓存的资源
///
/// 满足以下任一条件即视为命中：
/// - 完整 URL 与 CDN 上的 `pnnx.js` / `pnnx.wasm` 完全一致
/// - 与拦截器同源，且路径以 `/pnnx.js` 或 `/pnnx.wasm` 结尾
///
/// URL 解析失败时一律视为不命中。
#[derive(Clone, Debug)]
pub struct AssetClassifier {
    origin: Origin,
}

impl AssetClassifier {
    pub fn new(origin: &Url) -> Self {
        Self {
            origin: origin.origin(),
        }
    }

    pub fn classify(&self, request_url: &str) -> Option<TrackedAsset> {
        let url = Url::parse(request_url).ok()?;

        match url.as_str() {
            CDN_JS => return Some(TrackedAsset::Script),
            CDN_WASM => return Some(TrackedAsset::Wasm),
            _ => {}
        }

        if url.origin() != self.origin {
            return None;
        }
        let path = url.path();
        if path.ends_with(JS_SUFFIX) {
            Some(TrackedAsset::Script)
        } else if path.ends_with(WASM_SUFFIX) {
            Some(TrackedAsset::Wasm)
        } else {
            None
        }
    }
}
