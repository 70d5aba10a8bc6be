//! 缓存条目的磁盘持久化
//!
//! 每个命名缓存对应根目录下的一个子目录，每个条目由两个文件组成：
//! `<md5(url)>.json` 保存状态码、header 等元数据，`<md5(url)>.body` 保存响应体。

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    cache::response::{AssetResponse, ResponseKind},
    error::{Error, Result},
};

#[derive(Serialize, Deserialize, Debug)]
struct EntryMeta {
    url: String,
    status: u16,
    status_text: String,
    headers: Vec<(String, String)>,
    kind: ResponseKind,
    has_body: bool,
    stored_at: DateTime<Utc>,
}

/// 缓存名称可能包含路径分隔符，用 md5 作为目录名
pub fn store_dir(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{:x}", md5::compute(name)))
}

fn entry_stem(url: &str) -> String {
    format!("{:x}", md5::compute(url))
}

pub async fn write_entry(dir: &Path, response: &AssetResponse) -> Result<()> {
    fs::create_dir_all(dir).await?;

    let headers = response
        .headers
        .iter()
        .filter_map(|(name, value)| match value.to_str() {
            Ok(value) => Some((name.as_str().to_string(), value.to_string())),
            Err(_) => {
                warn!("Skip non-ascii header {name} when persisting {}", response.url);
                None
            }
        })
        .collect();
    let meta = EntryMeta {
        url: response.url.clone(),
        status: response.status.as_u16(),
        status_text: response.status_text.clone(),
        headers,
        kind: response.kind,
        has_body: response.body.is_some(),
        stored_at: Utc::now(),
    };

    let stem = entry_stem(&response.url);
    // body 先落盘，元数据存在即代表条目完整
    let body_path = dir.join(format!("{stem}.body"));
    match &response.body {
        Some(body) => fs::write(&body_path, body).await?,
        None => remove_if_exists(&body_path).await?,
    }
    fs::write(dir.join(format!("{stem}.json")), serde_json::to_vec(&meta)?).await?;
    debug!("Persisted cache entry {} to {:?}", response.url, dir);
    Ok(())
}

/// 读取目录下的全部条目，按写入时间排序
pub async fn read_entries(dir: &Path) -> Result<Vec<AssetResponse>> {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(err) => return Err(err.into()),
    };

    let mut entries = vec![];
    while let Some(file) = read_dir.next_entry().await? {
        let path = file.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        match read_entry(&path).await {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!("Skip broken cache entry {:?}: {}", path, err),
        }
    }
    entries.sort_by_key(|(stored_at, _)| *stored_at);
    Ok(entries.into_iter().map(|(_, response)| response).collect())
}

async fn read_entry(meta_path: &Path) -> Result<(DateTime<Utc>, AssetResponse)> {
    let meta: EntryMeta = serde_json::from_slice(&fs::read(meta_path).await?)?;

    let mut headers = HeaderMap::new();
    for (name, value) in &meta.headers {
        headers.append(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }
    let body = if meta.has_body {
        let body = fs::read(meta_path.with_extension("body")).await?;
        Some(Bytes::from(body))
    } else {
        None
    };
    let status = StatusCode::from_u16(meta.status)
        .map_err(|err| Error::Any(anyhow::anyhow!("invalid status {}: {err}", meta.status)))?;

    let response = AssetResponse {
        url: meta.url,
        status,
        status_text: meta.status_text,
        headers,
        body,
        kind: meta.kind,
    };
    Ok((meta.stored_at, response))
}

pub async fn remove_store(dir: &Path) -> Result<bool> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
