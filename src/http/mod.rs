use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::anyhow;
use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use http::StatusCode;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info};
use url::Url;

use crate::{
    config::Settings,
    consts::{CONTROL_PATH, MAX_BODY_SIZE},
    interceptor::AssetInterceptor,
    middlewares::{add_version, logging_route},
};

pub mod error;
// 拦截与转发
pub mod intercept;
// 控制通道
pub mod message;
pub mod response;

/// 所有路由共享的状态
#[derive(Clone)]
pub struct AppState {
    pub interceptor: Arc<AssetInterceptor>,
    /// 拦截器自身的 origin，用于还原源站形式的请求地址
    pub origin: Url,
}

/// 构建路由
///
/// - `POST /__pnnx/message`：控制通道
/// - 其余所有请求：交给拦截器处理
pub fn make_router(state: AppState, timeout: Duration) -> Router {
    let router = Router::new()
        .route(CONTROL_PATH, post(message::message))
        .fallback(intercept::serve)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(add_version))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::SERVICE_UNAVAILABLE,
                    timeout,
                )),
        );
    logging_route(router)
}

/// 启动服务器，返回用于关闭的句柄
pub async fn make_server(
    settings: &Settings,
    interceptor: Arc<AssetInterceptor>,
) -> anyhow::Result<Handle<SocketAddr>> {
    debug!("make_server start with settings: {:?}", settings);
    let state = AppState {
        interceptor,
        origin: settings.origin()?,
    };
    let router = make_router(state, Duration::from_secs(settings.timeout.into()));

    let addr = format!("{}:{}", settings.ip, settings.port);
    let addr: SocketAddr = addr.parse()?;

    let handle = Handle::new();
    let handle_clone = handle.clone();
    let (ssl, certificate, certificate_key) = (
        settings.ssl,
        settings.certificate.clone(),
        settings.certificate_key.clone(),
    );

    tokio::spawn(async move {
        if ssl {
            match (certificate, certificate_key) {
                (Some(cert), Some(key)) => {
                    debug!("Certificate: {} Certificate key: {}", cert, key);
                    match RustlsConfig::from_pem_file(&cert, &key).await {
                        Ok(rustls_config) => {
                            info!("Listening on https://{}", addr);
                            axum_server::bind_rustls(addr, rustls_config)
                                .handle(handle_clone)
                                .serve(router.into_make_service())
                                .await
                                .map_err(anyhow::Error::from)
                        }
                        Err(e) => Err(anyhow::Error::from(e)),
                    }
                }
                _ => Err(anyhow!("SSL enabled but certificate or key missing")),
            }
        } else {
            info!("Listening on http://{}", addr);
            axum_server::bind(addr)
                .handle(handle_clone)
                .serve(router.into_make_service())
                .await
                .map_err(anyhow::Error::from)
        }
    });

    Ok(handle)
}

/// 优雅关闭服务器
///
/// 服务器将在 30 秒内完成正在处理的请求后停止。
pub fn shutdown_server(handle: &Handle<SocketAddr>) {
    handle.graceful_shutdown(Some(Duration::from_secs(30)));
    info!("Server has been signaled to shut down");
}
