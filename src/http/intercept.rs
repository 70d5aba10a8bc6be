use axum::{
    body::Body,
    extract::{Request, State},
    response::Response,
};
use http::{HeaderValue, Uri};
use tracing::{debug, error};
use url::Url;

use super::{
    AppState,
    error::{RouteError, RouteResult},
    response::into_response,
};
use crate::{
    consts::{CACHE_BYPASS, CACHE_STATUS_HEADER, CLIENT_ID_HEADER, MAX_BODY_SIZE},
    interceptor::{AssetRequest, Event, EventOutcome},
};

/// 处理所有经过拦截器的请求
///
/// 1. 还原完整请求地址：绝对形式的请求地址原样使用，其余拼接到拦截器 origin 上。
/// 2. 分发 fetch 事件。
/// 3. 拦截器给出响应时直接返回，否则按正常网络请求转发。
///
/// 响应头 `X-Pnnx-Cache` 标明本次请求的缓存情况。
pub async fn serve(State(state): State<AppState>, req: Request<Body>) -> RouteResult<Response> {
    let url = request_url(&state.origin, req.uri()).ok_or(RouteError::BadRequest())?;
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|err| {
            error!("Failed to read request body: {}", err);
            RouteError::BadRequest()
        })?;
    let client_id = parts
        .headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let request = AssetRequest {
        method: parts.method,
        url,
        headers: parts.headers,
        body,
        client_id,
    };
    let outcome = state
        .interceptor
        .dispatch(Event::Fetch(request))
        .await
        .map_err(|err| {
            error!("Failed to fetch tracked asset: {}", err);
            RouteError::BadGateway()
        })?;

    let (response, cache_status) = match outcome {
        EventOutcome::Respond(response, status) => (response, status.as_str()),
        EventOutcome::Passthrough(request) => {
            debug!("passthrough {} {}", request.method, request.url);
            let response = state
                .interceptor
                .fetcher()
                .fetch(&request)
                .await
                .map_err(|err| {
                    error!("Failed to proxy request {}: {}", request.url, err);
                    RouteError::BadGateway()
                })?;
            (response, CACHE_BYPASS)
        }
        EventOutcome::Extended(_) => return Err(RouteError::InternalError()),
    };

    let mut res = into_response(response).map_err(anyhow::Error::from)?;
    res.headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
    Ok(res)
}

/// 还原请求的完整地址
///
/// 源站形式的路径直接拼接在 origin 之后，避免 `//host/path` 被当作协议相对地址。
pub fn request_url(origin: &Url, uri: &Uri) -> Option<String> {
    if uri.scheme().is_some() {
        return Url::parse(&uri.to_string()).ok().map(String::from);
    }
    let path_query = uri.path_and_query().map(|v| v.as_str()).unwrap_or("/");
    let url = format!("{}{}", origin.origin().ascii_serialization(), path_query);
    Url::parse(&url).ok().map(String::from)
}
