use std::{path::PathBuf, sync::Arc};

use dashmap::DashMap;
use tracing::{debug, info, warn};

pub mod disk;
pub mod response;
pub mod store;

pub use response::{AssetResponse, ResponseKind};
pub use store::{Cache, MatchOptions};

/// 命名缓存仓库的注册表
///
/// 每个缓存仓库在第一次 `open` 时创建，只有显式调用 `delete` 才会整体移除。
/// 配置了根目录时，缓存内容会持久化到磁盘，重启后第一次 `open` 时加载。
#[derive(Debug, Default)]
pub struct CacheStorage {
    root: Option<PathBuf>,
    caches: DashMap<String, Arc<Cache>>,
}

impl CacheStorage {
    /// Memory only storage
    pub fn memory() -> Self {
        Self::default()
    }

    /// Storage persisted under `root`
    pub fn persistent(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            caches: DashMap::new(),
        }
    }

    /// 打开命名缓存，不存在时创建
    pub async fn open(&self, name: &str) -> Arc<Cache> {
        if let Some(cache) = self.caches.get(name) {
            return cache.clone();
        }

        let dir = self.root.as_ref().map(|root| disk::store_dir(root, name));
        let entries = match &dir {
            Some(dir) => disk::read_entries(dir).await.unwrap_or_else(|err| {
                warn!("Failed to load cache {name} from {:?}: {err}", dir);
                vec![]
            }),
            None => vec![],
        };
        if !entries.is_empty() {
            info!("Loaded {} entries into cache {name}", entries.len());
        }

        // 并发 open 时以先插入的为准
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Cache::new(name, dir, entries)))
            .clone()
    }

    pub async fn has(&self, name: &str) -> bool {
        if self.caches.contains_key(name) {
            return true;
        }
        match &self.root {
            Some(root) => tokio::fs::try_exists(disk::store_dir(root, name))
                .await
                .unwrap_or(false),
            None => false,
        }
    }

    /// 删除整个命名缓存，返回缓存是否存在
    pub async fn delete(&self, name: &str) -> bool {
        let cache = self.caches.remove(name).map(|(_, cache)| cache);
        let removed = cache.is_some();
        // 持有 guard 直到目录删除完成，进行中的写入不会把目录重新建出来
        let _guard = match &cache {
            Some(cache) => Some(cache.detach().await),
            None => None,
        };

        let removed_on_disk = match &self.root {
            Some(root) => disk::remove_store(&disk::store_dir(root, name))
                .await
                .unwrap_or_else(|err| {
                    warn!("Failed to remove cache {name} from disk: {err}");
                    false
                }),
            None => false,
        };

        let existed = removed || removed_on_disk;
        debug!("Cache {name} deleted: {existed}");
        existed
    }

    /// Names of the caches opened in this process
    pub fn keys(&self) -> Vec<String> {
        self.caches.iter().map(|cache| cache.key().clone()).collect()
    }
}
