use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use url::Url;

use crate::cache::{disk, response::AssetResponse};

/// Options for [`Cache::match_request`]
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchOptions {
    /// Compare URLs with the query string removed
    pub ignore_search: bool,
}

/// One named cache store.
///
/// Entries keep their insertion order; a query-ignoring lookup returns
/// the first entry that matches.
#[derive(Debug)]
pub struct Cache {
    name: String,
    dir: Option<PathBuf>,
    entries: RwLock<Vec<AssetResponse>>,
    /// 已被 `CacheStorage::delete` 移除，不再写入磁盘
    detached: AtomicBool,
    /// 写盘与删除目录互斥
    disk: Mutex<()>,
}

impl Cache {
    pub(crate) fn new(name: &str, dir: Option<PathBuf>, entries: Vec<AssetResponse>) -> Self {
        Self {
            name: name.to_string(),
            dir,
            entries: RwLock::new(entries),
            detached: AtomicBool::new(false),
            disk: Mutex::new(()),
        }
    }

    /// 查找请求对应的缓存响应，返回的是一份副本
    pub fn match_request(&self, url: &str, options: MatchOptions) -> Option<AssetResponse> {
        let target = request_key(url, options.ignore_search);
        let entries = self.entries.read();
        entries
            .iter()
            .find(|entry| request_key(&entry.url, options.ignore_search) == target)
            .cloned()
    }

    /// 写入缓存，相同 URL 的旧条目会被替换。
    ///
    /// 配置了持久化目录时同步写入磁盘，写盘失败只记录日志，内存中的条目仍然有效。
    pub async fn put(&self, url: &str, mut response: AssetResponse) {
        let key = request_key(url, false);
        response.url = key.clone();
        {
            let mut entries = self.entries.write();
            match entries.iter_mut().find(|entry| entry.url == key) {
                Some(entry) => *entry = response.clone(),
                None => entries.push(response.clone()),
            }
        }
        debug!("Cache {} stored {}", self.name, key);

        let Some(dir) = &self.dir else {
            return;
        };
        let _guard = self.disk.lock().await;
        if self.detached.load(Ordering::Acquire) {
            return;
        }
        if let Err(err) = disk::write_entry(dir, &response).await {
            warn!("Failed to persist cache entry {key}: {err}");
        }
    }

    /// 所有条目的 URL，按写入顺序
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().iter().map(|entry| entry.url.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 标记为已删除并清空条目。
    ///
    /// 返回的 guard 持有期间没有写盘操作，调用方在此期间删除磁盘目录。
    pub(crate) async fn detach(&self) -> MutexGuard<'_, ()> {
        let guard = self.disk.lock().await;
        self.detached.store(true, Ordering::Release);
        self.entries.write().clear();
        guard
    }
}

/// Normalize a request URL into a cache key.
///
/// Fragments never take part in the comparison. Unparsable URLs are
/// compared as raw strings.
fn request_key(url: &str, ignore_search: bool) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            if ignore_search {
                parsed.set_query(None);
            }
            parsed.into()
        }
        Err(_) => {
            let url = url.split('#').next().unwrap_or(url);
            if ignore_search {
                url.split('?').next().unwrap_or(url).to_string()
            } else {
                url.to_string()
            }
        }
    }
}
