use std::{fs, path::PathBuf};

use serde::Deserialize;
use url::Url;

use crate::{
    consts::{fetch_timeout_default, host_ip, host_port, log_folder, log_level},
    error::{Error, Result},
};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    /// Listen address
    #[serde(default = "host_ip")]
    pub ip: String,
    #[serde(default = "host_port")]
    pub port: u16,
    /// 拦截器自身的 origin，同源资源按此判断。
    /// 未配置时使用 `http://{ip}:{port}`
    pub origin: Option<Url>,
    /// 同源请求实际转发的上游地址
    pub upstream: Option<Url>,
    /// Network fetch timeout in seconds
    #[serde(default = "fetch_timeout_default")]
    pub timeout: u16,
    #[serde(default = "log_level")]
    pub log_level: String,
    #[serde(default = "log_folder")]
    pub log_folder: String,
    /// 缓存持久化目录，未配置时仅保存在内存中
    pub cache_dir: Option<PathBuf>,
    /// Enable HTTPS
    #[serde(default)]
    pub ssl: bool,
    /// Certificate path
    pub certificate: Option<String>,
    /// Certificate key path
    pub certificate_key: Option<String>,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self> {
        let file = fs::read_to_string(path)?;
        Self::from_toml(&file)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The origin every same-origin request is resolved against
    pub fn origin(&self) -> Result<Url> {
        match &self.origin {
            Some(origin) => Ok(origin.clone()),
            None => Ok(Url::parse(&format!("http://{}:{}", self.ip, self.port))?),
        }
    }

    fn validate(&self) -> Result<()> {
        let origin = self.origin()?;
        check_http_url("origin", &origin)?;
        if let Some(upstream) = &self.upstream {
            check_http_url("upstream", upstream)?;
        }
        if self.ssl && (self.certificate.is_none() || self.certificate_key.is_none()) {
            return Err(Error::Config(
                "ssl enabled but certificate or certificate_key missing".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(Error::Config("timeout must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn check_http_url(field: &str, url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "{field} must use http or https, got {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::Config(format!("{field} must contain a host: {url}")));
    }
    Ok(())
}
