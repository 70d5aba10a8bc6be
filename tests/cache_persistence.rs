//! 磁盘持久化测试

use anyhow::Result;
use reqwest::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

use pnnx_cache::consts::{CACHE_STATUS_HEADER, CONTROL_PATH};

#[tokio::test]
async fn test_cache_survives_restart() -> Result<()> {
    let (_temp_dir, cache_dir) = temp_cache_dir()?;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pnnx.wasm"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(WASM_BYTES.to_vec()))
        .mount(&upstream)
        .await;

    let settings = test_settings(&upstream.uri(), Some(&cache_dir))?;
    let server = start_test_server(&settings).await?;
    let res = client().get(server.url("/pnnx.wasm")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    server.stop().await;

    // 新实例从磁盘加载缓存，不再请求上游
    let server = start_test_server(&settings).await?;
    let res = client().get(server.url("/pnnx.wasm?v=9")).send().await?;
    assert_eq!(res.headers().get(CACHE_STATUS_HEADER).unwrap(), "HIT");
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "application/wasm"
    );
    assert_eq!(res.bytes().await?.to_vec(), WASM_BYTES.to_vec());
    assert_eq!(upstream.received_requests().await.unwrap().len(), 1);
    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_clear_removes_persisted_cache() -> Result<()> {
    let (_temp_dir, cache_dir) = temp_cache_dir()?;
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pnnx.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("js"))
        .mount(&upstream)
        .await;

    let settings = test_settings(&upstream.uri(), Some(&cache_dir))?;
    let server = start_test_server(&settings).await?;
    let client = client();
    client.get(server.url("/pnnx.js")).send().await?;
    client
        .post(server.url(CONTROL_PATH))
        .body(r#"{"type":"CLEAR_PNNX_CACHE"}"#)
        .send()
        .await?;
    // shutdown 会等待清除任务完成
    server.stop().await;

    let server = start_test_server(&settings).await?;
    let res = client.get(server.url("/pnnx.js")).send().await?;
    assert_eq!(res.headers().get(CACHE_STATUS_HEADER).unwrap(), "MISS");
    assert_eq!(upstream.received_requests().await.unwrap().len(), 2);
    server.stop().await;
    Ok(())
}
