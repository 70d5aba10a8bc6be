use std::env;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const OS: &str = env::consts::OS;
pub const ARCH: &str = env::consts::ARCH;
pub const COMPILER: &str = env!("PNNX_COMPILER");
pub const COMMIT: &str = env!("PNNX_COMMIT");

/// 缓存仓库名称，升级版本号即可让旧版本的缓存条目全部失效
pub const CACHE_NAME: &str = "pnnx-assets-v1";

// tracked assets
pub const CDN_JS: &str = "https://mirrors.sdu.edu.cn/ncnn_modelzoo/pnnx/pnnx.js";
pub const CDN_WASM: &str = "https://mirrors.sdu.edu.cn/ncnn_modelzoo/pnnx/pnnx.wasm";
pub const JS_SUFFIX: &str = "/pnnx.js";
pub const WASM_SUFFIX: &str = "/pnnx.wasm";
/// 需要修正 Content-Type 的二进制资源扩展名
pub const WASM_EXTENSION: &str = ".wasm";
pub const WASM_CONTENT_TYPE: &str = "application/wasm";

/// 控制消息中清空缓存的信号
pub const CLEAR_CACHE_MESSAGE: &str = "CLEAR_PNNX_CACHE";
pub const CONTROL_PATH: &str = "/__pnnx/message";
/// 页面标识请求头
pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const CACHE_VERSION_HEADER: &str = "x-pnnx-cache-version";
/// 缓存命中情况：HIT / MISS / SKIP / BYPASS
pub const CACHE_STATUS_HEADER: &str = "x-pnnx-cache";
pub const CACHE_BYPASS: &str = "BYPASS";

/// 转发请求体的最大长度
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

// config defaults
pub const HOST_IP: &str = "127.0.0.1";
pub fn host_ip() -> String {
    HOST_IP.to_string()
}

pub const HOST_PORT: u16 = 8080;
pub fn host_port() -> u16 {
    HOST_PORT
}

pub const FETCH_TIMEOUT_DEFAULT: u16 = 75;
pub fn fetch_timeout_default() -> u16 {
    FETCH_TIMEOUT_DEFAULT
}

pub const LOG_LEVEL: &str = "info";
pub fn log_level() -> String {
    LOG_LEVEL.to_string()
}

pub const LOG_FOLDER: &str = "./logs";
pub fn log_folder() -> String {
    LOG_FOLDER.to_string()
}
