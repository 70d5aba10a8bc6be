use http::{HeaderMap, HeaderName};

/// 检查给定的头部是否应该在转发时被排除。
/// 像 "host"、"connection" 等逐跳头部只对单个连接有效，不应转发。
pub fn is_exclude_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "host"
            | "connection"
            | "proxy-authenticate"
            | "upgrade"
            | "proxy-authorization"
            | "proxy-connection"
            | "keep-alive"
            | "transfer-encoding"
            | "te"
            | "trailer"
    )
}

/// 将头部从一个 `HeaderMap` 复制到另一个，排除在 `is_exclude_header` 中指定的头部。
pub fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from.iter() {
        if !is_exclude_header(name) {
            to.append(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_exclude_header() {
        assert!(is_exclude_header(&http::header::HOST));
        assert!(is_exclude_header(&http::header::CONNECTION));
        assert!(is_exclude_header(&http::header::UPGRADE));
        assert!(is_exclude_header(&http::header::TRANSFER_ENCODING));
        assert!(is_exclude_header(&http::header::TE));
        assert!(is_exclude_header(&HeaderName::from_static("keep-alive")));

        assert!(!is_exclude_header(&http::header::USER_AGENT));
        assert!(!is_exclude_header(&http::header::CONTENT_TYPE));
        assert!(!is_exclude_header(&http::header::ACCEPT));
        assert!(!is_exclude_header(&http::header::ETAG));
    }

    #[test]
    fn test_copy_headers() {
        let mut from = HeaderMap::new();
        from.insert(http::header::HOST, HeaderValue::from_static("example.com"));
        from.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/wasm"),
        );
        from.insert(
            http::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        from.append(http::header::VARY, HeaderValue::from_static("accept"));
        from.append(http::header::VARY, HeaderValue::from_static("origin"));

        let mut to = HeaderMap::new();
        copy_headers(&from, &mut to);

        assert!(!to.contains_key(http::header::HOST));
        assert!(!to.contains_key(http::header::CONNECTION));
        assert_eq!(
            to.get(http::header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/wasm"))
        );
        assert_eq!(to.get_all(http::header::VARY).iter().count(), 2);
    }
}
