use std::io;

use http::header::{InvalidHeaderName, InvalidHeaderValue};

#[allow(clippy::enum_variant_names)]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    // from
    #[error("failed io {0}")]
    Io(#[from] io::Error),
    #[error("failed to decode toml {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("failed to handle json {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to handle http {0}")]
    Http(#[from] http::Error),
    #[error("failed to fetch {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to parse url {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid header name {0}")]
    InvalidHeaderName(#[from] InvalidHeaderName),
    #[error("invalid header value {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),
    #[error("invalid lifecycle transition: {0}")]
    Lifecycle(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal server error {0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = anyhow::Result<T, E>;
