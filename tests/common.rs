//! 集成测试的公共辅助函数和工具

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum_server::Handle;

use pnnx_cache::application::start_interceptor;
use pnnx_cache::config::Settings;
use pnnx_cache::http;
use pnnx_cache::interceptor::AssetInterceptor;

/// 测试中使用的拦截器 origin，与监听地址无关
pub const TEST_ORIGIN: &str = "http://pnnx.test";

/// wasm 魔数加版本号
pub const WASM_BYTES: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: Handle<SocketAddr>,
    pub interceptor: Arc<AssetInterceptor>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        pnnx_cache::application::shutdown_application(&self.handle, &self.interceptor).await;
    }
}

/// 生成测试配置，监听随机端口
pub fn test_settings(upstream: &str, cache_dir: Option<&Path>) -> Result<Settings> {
    let mut content = String::new();
    content.push_str("ip = \"127.0.0.1\"\n");
    content.push_str("port = 0\n");
    content.push_str(&format!("origin = \"{}\"\n", TEST_ORIGIN));
    content.push_str(&format!("upstream = \"{}\"\n", upstream));
    content.push_str("timeout = 5\n");
    content.push_str("log_folder = \"\"\n");
    if let Some(dir) = cache_dir {
        content.push_str(&format!(
            "cache_dir = \"{}\"\n",
            dir.to_str().expect("Invalid path")
        ));
    }
    Ok(Settings::from_toml(&content)?)
}

/// 未配置 origin 与 upstream 的最小配置，origin 即监听地址
pub fn standalone_settings(port: u16) -> Result<Settings> {
    let content = format!(
        "ip = \"127.0.0.1\"\nport = {port}\ntimeout = 2\nlog_folder = \"\"\n"
    );
    Ok(Settings::from_toml(&content)?)
}

/// 向系统申请一个当前空闲的端口
pub fn free_port() -> Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// 启动测试服务器
pub async fn start_test_server(settings: &Settings) -> Result<TestServer> {
    let interceptor = start_interceptor(settings).await?;
    let handle = http::make_server(settings, interceptor.clone()).await?;
    let addr = handle.listening().await.expect("Server not listening");
    Ok(TestServer {
        addr,
        handle,
        interceptor,
    })
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .no_proxy()
        .build()
        .expect("Failed to build client")
}

pub fn temp_cache_dir() -> Result<(tempfile::TempDir, PathBuf)> {
    let temp_dir = tempfile::TempDir::new()?;
    let path = temp_dir.path().join("cache");
    Ok((temp_dir, path))
}
