//! # 缓存条目
//!
//! 单个缓存键对应的数据及其访问元信息。

use std::time::Duration;

use serde::Serialize;

use super::clock::duration_millis;

/// 缓存项
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<T> {
    pub(crate) data: T,
    pub(crate) inserted_at: i64,
    pub(crate) ttl: Duration,
    pub(crate) access_count: u64,
    pub(crate) last_accessed_at: i64,
    /// 插入序号，时间戳相同时用于保持插入顺序
    pub(crate) sequence: u64,
}

impl<T> CacheEntry<T> {
    pub(crate) const fn new(data: T, now: i64, ttl: Duration, sequence: u64) -> Self {
        Self {
            data,
            inserted_at: now,
            ttl,
            access_count: 1,
            last_accessed_at: now,
            sequence,
        }
    }

    /// `now - inserted_at > ttl` 即视为过期
    pub(crate) fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.inserted_at) > duration_millis(self.ttl)
    }

    pub(crate) fn touch(&mut self, now: i64) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed_at = now;
    }

    pub(crate) const fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            inserted_at: self.inserted_at,
            ttl: self.ttl,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
        }
    }
}

/// 条目元信息的只读快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryMetadata {
    /// 写入时间（Unix 毫秒）
    pub inserted_at: i64,
    /// 条目自身的存活时间
    pub ttl: Duration,
    /// 访问次数，写入时为 1
    pub access_count: u64,
    /// 最近访问时间（Unix 毫秒）
    pub last_accessed_at: i64,
}
