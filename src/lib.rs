//! pnnx 资源拦截缓存
//!
//! 拦截 `pnnx.js` 与 `pnnx.wasm` 的请求，优先返回缓存，
//! 未命中时请求网络并写入缓存，同时修正 wasm 的 `Content-Type`。

pub mod application;
pub mod cache;
pub mod cli;
pub mod config;
pub mod consts;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod middlewares;
pub mod utils;
