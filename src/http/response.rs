use axum::{body::Body, response::Response};
use http::header::CONTENT_LENGTH;
use hyper::ext::ReasonPhrase;
use tracing::debug;

use crate::{cache::AssetResponse, error::Result, utils::headers::copy_headers};

/// 将拦截器的响应转换为 axum 响应
///
/// 状态文本与标准文本不同时通过 HTTP/1 reason phrase 写回，HTTP/2 下会被忽略。
pub fn into_response(asset: AssetResponse) -> Result<Response> {
    let mut builder = Response::builder().status(asset.status);
    if let Some(headers) = builder.headers_mut() {
        copy_headers(&asset.headers, headers);
        // body 已完整缓冲，长度由 hyper 重新计算
        headers.remove(CONTENT_LENGTH);
    }

    let canonical = asset.status.canonical_reason().unwrap_or_default();
    if !asset.status_text.is_empty() && asset.status_text != canonical {
        match ReasonPhrase::try_from(asset.status_text.clone().into_bytes()) {
            Ok(reason) => builder = builder.extension(reason),
            Err(_) => debug!("Drop invalid reason phrase {:?}", asset.status_text),
        }
    }

    let body = match asset.body {
        Some(bytes) => Body::from(bytes),
        None => Body::empty(),
    };
    Ok(builder.body(body)?)
}

#[cfg(test)]
mod tests {
    use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};

    use super::*;

    #[tokio::test]
    async fn test_into_response() {
        let asset = AssetResponse::new("https://cdn/pnnx.wasm", StatusCode::OK)
            .with_body(vec![0u8, 97, 115, 109])
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/wasm"))
            .with_header(CONTENT_LENGTH, HeaderValue::from_static("999"))
            .with_header(http::header::CONNECTION, HeaderValue::from_static("close"));

        let res = into_response(asset).unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/wasm"))
        );
        assert!(res.headers().get(CONTENT_LENGTH).is_none());
        assert!(res.headers().get(http::header::CONNECTION).is_none());
        assert!(res.extensions().get::<ReasonPhrase>().is_none());

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], &[0u8, 97, 115, 109]);
    }

    #[test]
    fn test_custom_reason_phrase() {
        let mut asset = AssetResponse::new("https://cdn/pnnx.js", StatusCode::OK);
        asset.status_text = "Served".to_string();
        let res = into_response(asset).unwrap();
        let reason = res.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(reason.as_bytes(), b"Served");
    }
}
