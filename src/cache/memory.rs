//! # 端点缓存
//!
//! 单个端点命名空间内的内存缓存：键到条目的映射加一份 [`CacheConfig`]。
//! 过期检测是惰性的（`get` / `has` 时发现并删除），容量超限时在 `set` 中批量淘汰。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;

use super::clock::{Clock, system_clock};
use super::entry::{CacheEntry, EntryMetadata};
use super::eviction;
use super::lock::{rw_read, rw_write};
use super::strategies::CacheConfig;
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

const SOURCE: &str = "cache::memory";

/// 可缓存值的约束
pub trait CacheableValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> CacheableValue for T {}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// 当前存储的条目数（包含尚未被清理的过期条目）
    pub size: usize,
    /// 最大条目数
    pub max_size: usize,
    /// 命中率，由 [`CacheMetrics`] 的命中/未命中计数得出
    pub hit_rate: f64,
    /// 所有条目访问次数之和
    pub total_accesses: u64,
    /// 各条目最近访问时间（Unix 毫秒）的平均值；这是时间戳而不是耗时
    pub average_access_time: f64,
}

/// 命中与淘汰计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

impl CacheMetrics {
    /// 命中率，无访问时为 0
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    metrics: CacheMetrics,
    next_sequence: u64,
}

/// 单个端点的内存缓存
pub struct ApiCache<T> {
    name: String,
    config: CacheConfig,
    state: RwLock<CacheState<T>>,
    clock: Arc<dyn Clock>,
}

impl<T: CacheableValue> ApiCache<T> {
    /// 使用系统时钟创建匿名缓存
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock("anonymous", config, system_clock())
    }

    /// 使用系统时钟创建具名缓存（名称用于日志）
    pub fn named(name: impl Into<String>, config: CacheConfig) -> Self {
        Self::with_clock(name, config, system_clock())
    }

    /// 使用指定时钟创建缓存
    pub fn with_clock(name: impl Into<String>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                metrics: CacheMetrics::default(),
                next_sequence: 0,
            }),
            clock,
        }
    }

    /// 缓存名称
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 创建时确定的配置
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// 读取缓存值
    ///
    /// 命中时更新访问次数和最近访问时间；过期条目会被删除并返回 `None`。
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now_millis();
        let mut guard = rw_write(&self.state, SOURCE, "get");
        let state = &mut *guard;

        match state.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                state.metrics.hits += 1;
                return Some(entry.data.clone());
            }
            Some(_) => {
                state.entries.remove(key);
                state.metrics.expirations += 1;
                self.log_expired(key);
            }
            None => {}
        }

        state.metrics.misses += 1;
        None
    }

    /// 写入缓存值
    ///
    /// 当前条目数达到 `max_size` 时先按策略批量淘汰，再插入新条目。
    /// 已存在的键会被直接覆盖，不继承旧条目的访问统计。
    pub fn set(&self, key: impl Into<String>, data: T, ttl: Option<Duration>) {
        let key = key.into();
        let now = self.clock.now_millis();
        let mut guard = rw_write(&self.state, SOURCE, "set");
        let state = &mut *guard;

        if state.entries.len() >= self.config.max_size {
            let victims = eviction::select_victims(&state.entries, self.config.strategy, now);
            for victim in &victims {
                state.entries.remove(victim);
            }
            state.metrics.evictions += victims.len() as u64;

            ldebug!(
                "system",
                LogStage::Eviction,
                LogComponent::Cache,
                "evict_batch",
                &format!("容量达到上限，批量淘汰 {} 个条目", victims.len()),
                cache = %self.name,
                strategy = %self.config.strategy,
                max_size = self.config.max_size,
                evicted = victims.len()
            );
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let entry = CacheEntry::new(data, now, ttl.unwrap_or(self.config.ttl), sequence);
        state.entries.insert(key, entry);
        state.metrics.inserts += 1;
    }

    /// 检查键是否存在且未过期（不更新访问统计）
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        let mut guard = rw_write(&self.state, SOURCE, "has");
        let state = &mut *guard;

        match state.entries.get(key) {
            None => false,
            Some(entry) if entry.is_expired(now) => {
                state.entries.remove(key);
                state.metrics.expirations += 1;
                self.log_expired(key);
                false
            }
            Some(_) => true,
        }
    }

    /// 删除条目，返回是否确实删除了内容
    pub fn delete(&self, key: &str) -> bool {
        rw_write(&self.state, SOURCE, "delete")
            .entries
            .remove(key)
            .is_some()
    }

    /// 删除所有键中包含 `pattern` 子串的条目，返回删除数量
    pub fn delete_matching(&self, pattern: &str) -> usize {
        let mut state = rw_write(&self.state, SOURCE, "delete_matching");
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.contains(pattern));
        before - state.entries.len()
    }

    /// 清空所有条目
    pub fn clear(&self) {
        rw_write(&self.state, SOURCE, "clear").entries.clear();
    }

    /// 当前存储的条目数，不做过期检测
    #[must_use]
    pub fn size(&self) -> usize {
        rw_read(&self.state, SOURCE, "size").entries.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// 统计信息
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_stats(&self) -> CacheStats {
        let state = rw_read(&self.state, SOURCE, "get_stats");
        let size = state.entries.len();
        let total_accesses = state.entries.values().map(|e| e.access_count).sum();
        let average_access_time = if size == 0 {
            0.0
        } else {
            let sum: f64 = state
                .entries
                .values()
                .map(|e| e.last_accessed_at as f64)
                .sum();
            sum / size as f64
        };

        CacheStats {
            size,
            max_size: self.config.max_size,
            hit_rate: state.metrics.hit_rate(),
            total_accesses,
            average_access_time,
        }
    }

    /// 命中/淘汰计数快照
    #[must_use]
    pub fn metrics(&self) -> CacheMetrics {
        rw_read(&self.state, SOURCE, "metrics").metrics
    }

    /// 条目元信息（不触发过期清理，也不计为访问）
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<EntryMetadata> {
        rw_read(&self.state, SOURCE, "metadata")
            .entries
            .get(key)
            .map(CacheEntry::metadata)
    }

    /// 当前所有键（按字典序）
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = rw_read(&self.state, SOURCE, "keys")
            .entries
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// 主动清理所有已过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut guard = rw_write(&self.state, SOURCE, "purge_expired");
        let state = &mut *guard;
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - state.entries.len();
        state.metrics.expirations += purged as u64;
        purged
    }

    fn log_expired(&self, key: &str) {
        ldebug!(
            "system",
            LogStage::Eviction,
            LogComponent::Cache,
            "lazy_expire",
            "条目已过期，访问时删除",
            cache = %self.name,
            key = key
        );
    }
}

impl<T> std::fmt::Debug for ApiCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCache")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
