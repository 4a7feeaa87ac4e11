//! # 缓存管理器
//!
//! 按端点名划分缓存命名空间：每个端点一个独立的 [`ApiCache`]，首次访问时按需创建。
//! 条目不会在端点之间移动，失效和统计也都以端点为单位进行。

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde_json::Value;

use super::clock::{Clock, system_clock};
use super::keys::try_generate_key;
use super::memory::{ApiCache, CacheStats, CacheableValue};
use super::strategies::CacheConfig;
use crate::config::ApiCacheSettings;
use crate::error::{ApiCacheError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

static DEFAULT_MANAGER: LazyLock<ApiCacheManager> = LazyLock::new(ApiCacheManager::new);

/// 进程级默认管理器（存放 JSON 值）
///
/// 仅为方便使用而提供；需要隔离或自定义配置时请自行构造 [`ApiCacheManager`]。
#[must_use]
pub fn default_manager() -> &'static ApiCacheManager {
    &DEFAULT_MANAGER
}

/// 多端点缓存管理器
pub struct ApiCacheManager<T = Value> {
    caches: DashMap<String, Arc<ApiCache<T>>>,
    default_config: CacheConfig,
    endpoint_configs: HashMap<String, CacheConfig>,
    clock: Arc<dyn Clock>,
}

impl<T: CacheableValue> Default for ApiCacheManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CacheableValue> ApiCacheManager<T> {
    /// 使用默认配置创建
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_config(CacheConfig::default())
    }

    /// 指定新建缓存的默认配置
    #[must_use]
    pub fn with_default_config(default_config: CacheConfig) -> Self {
        Self::with_clock(default_config, system_clock())
    }

    /// 指定默认配置和时钟
    #[must_use]
    pub fn with_clock(default_config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            caches: DashMap::new(),
            default_config,
            endpoint_configs: HashMap::new(),
            clock,
        }
    }

    /// 从配置文件创建，按端点应用各自的缓存配置
    pub fn with_settings(settings: &ApiCacheSettings) -> Result<Self> {
        settings.validate()?;
        let mut manager = Self::with_default_config(settings.default_cache_config());
        manager.endpoint_configs = settings.endpoint_configs();
        Ok(manager)
    }

    /// 替换时钟（仅影响之后新建的缓存）
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 获取端点缓存，不存在时创建
    ///
    /// `config` 只在创建时生效；缓存已存在时忽略。未提供时依次取端点配置和默认配置。
    pub fn get_cache(&self, endpoint: &str, config: Option<CacheConfig>) -> Arc<ApiCache<T>> {
        if let Some(cache) = self.caches.get(endpoint) {
            return Arc::clone(cache.value());
        }

        let cache = match self.caches.entry(endpoint.to_string()) {
            Entry::Occupied(entry) => return Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let config = config.unwrap_or_else(|| self.config_for(endpoint));
                let cache = Arc::new(ApiCache::with_clock(
                    endpoint,
                    config,
                    Arc::clone(&self.clock),
                ));
                entry.insert(Arc::clone(&cache));
                cache
            }
        };

        let config = cache.config();
        linfo!(
            "system",
            LogStage::Cache,
            LogComponent::CacheManager,
            "create_cache",
            &format!("创建端点缓存: {endpoint}"),
            endpoint = endpoint,
            ttl_secs = config.ttl.as_secs(),
            max_size = config.max_size,
            strategy = %config.strategy
        );
        cache
    }

    /// 写入并原样返回
    pub fn cache_response(&self, endpoint: &str, key: &str, data: T, ttl: Option<Duration>) -> T {
        self.get_cache(endpoint, None).set(key, data.clone(), ttl);
        data
    }

    /// 读取缓存的响应
    pub fn get_cached_response(&self, endpoint: &str, key: &str) -> Option<T> {
        self.get_cache(endpoint, None).get(key)
    }

    /// 使端点缓存失效
    ///
    /// 提供 `pattern` 时删除键中包含该子串的条目，否则清空整个端点。
    /// 端点尚未创建时什么也不做，返回删除的条目数。
    pub fn invalidate_cache(&self, endpoint: &str, pattern: Option<&str>) -> usize {
        let Some(cache) = self.existing(endpoint) else {
            return 0;
        };

        let removed = match pattern {
            Some(pattern) => cache.delete_matching(pattern),
            None => {
                let size = cache.size();
                cache.clear();
                size
            }
        };

        linfo!(
            "system",
            LogStage::Invalidation,
            LogComponent::CacheManager,
            "invalidate_cache",
            &format!("端点缓存失效: {endpoint}, 删除 {removed} 个条目"),
            endpoint = endpoint,
            pattern = pattern.unwrap_or("*"),
            removed = removed
        );
        removed
    }

    /// 清空所有端点缓存（端点本身保留）
    pub fn invalidate_all_caches(&self) {
        let caches = self.snapshot();
        for (_, cache) in &caches {
            cache.clear();
        }

        linfo!(
            "system",
            LogStage::Invalidation,
            LogComponent::CacheManager,
            "invalidate_all_caches",
            "清空所有端点缓存",
            endpoints = caches.len()
        );
    }

    /// 各端点统计信息（按端点名排序）
    #[must_use]
    pub fn get_cache_stats(&self) -> BTreeMap<String, CacheStats> {
        self.snapshot()
            .into_iter()
            .map(|(endpoint, cache)| (endpoint, cache.get_stats()))
            .collect()
    }

    /// 已创建的端点名（按字典序）
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self.caches.iter().map(|c| c.key().clone()).collect();
        endpoints.sort();
        endpoints
    }

    /// 清理所有端点中的过期条目，返回清理总数
    pub fn purge_expired(&self) -> usize {
        let purged: usize = self
            .snapshot()
            .iter()
            .map(|(_, cache)| cache.purge_expired())
            .sum();

        if purged > 0 {
            ldebug!(
                "system",
                LogStage::Eviction,
                LogComponent::CacheManager,
                "purge_expired",
                &format!("清理过期条目 {purged} 个"),
                purged = purged
            );
        }
        purged
    }

    /// 先查缓存，未命中时调用 `fetcher` 获取并写入
    ///
    /// 键由 `endpoint` 和 `params` 生成。`fetcher` 失败时返回 [`ApiCacheError::Fetch`]，
    /// 失败结果不会写入缓存。
    pub async fn fetch_or_cache<P, F, Fut, E>(&self, endpoint: &str, params: &P, fetcher: F) -> Result<T>
    where
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<anyhow::Error>,
    {
        let key = try_generate_key(endpoint, params)?;
        let cache = self.get_cache(endpoint, None);

        if let Some(hit) = cache.get(&key) {
            return Ok(hit);
        }

        let data = fetcher().await.map_err(|e| {
            ApiCacheError::fetch_with_source(format!("端点 {endpoint} 数据获取失败"), e)
        })?;
        cache.set(key, data.clone(), None);
        Ok(data)
    }

    fn config_for(&self, endpoint: &str) -> CacheConfig {
        self.endpoint_configs
            .get(endpoint)
            .copied()
            .unwrap_or(self.default_config)
    }

    fn existing(&self, endpoint: &str) -> Option<Arc<ApiCache<T>>> {
        self.caches.get(endpoint).map(|c| Arc::clone(c.value()))
    }

    // Collected up front so no DashMap shard lock is held while a cache lock is taken.
    fn snapshot(&self) -> Vec<(String, Arc<ApiCache<T>>)> {
        self.caches
            .iter()
            .map(|c| (c.key().clone(), Arc::clone(c.value())))
            .collect()
    }
}

impl<T> std::fmt::Debug for ApiCacheManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCacheManager")
            .field("endpoints", &self.caches.len())
            .field("default_config", &self.default_config)
            .finish_non_exhaustive()
    }
}
