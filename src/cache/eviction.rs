//! # 淘汰策略引擎
//!
//! 容量达到上限时批量淘汰当前条目数的 25%（向上取整），而不是每次溢出只淘汰一个。

use std::cmp::Ordering;
use std::collections::HashMap;

use super::entry::CacheEntry;
use super::strategies::EvictionStrategy;

/// 本轮需要淘汰的条目数：`ceil(0.25 * current)`
pub(crate) const fn eviction_count(current: usize) -> usize {
    current.div_ceil(4)
}

/// 按策略排序后取前 `eviction_count` 个键
///
/// 排序键相同时按插入序号决定先后，保证结果确定。
pub(crate) fn select_victims<T>(
    entries: &HashMap<String, CacheEntry<T>>,
    strategy: EvictionStrategy,
    now: i64,
) -> Vec<String> {
    let count = eviction_count(entries.len());
    if count == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(&String, &CacheEntry<T>)> = entries.iter().collect();
    candidates.sort_by(|(_, a), (_, b)| {
        compare(a, b, strategy, now).then_with(|| a.sequence.cmp(&b.sequence))
    });

    candidates
        .into_iter()
        .take(count)
        .map(|(key, _)| key.clone())
        .collect()
}

fn compare<T>(a: &CacheEntry<T>, b: &CacheEntry<T>, strategy: EvictionStrategy, now: i64) -> Ordering {
    match strategy {
        EvictionStrategy::Lru => a.last_accessed_at.cmp(&b.last_accessed_at),
        EvictionStrategy::Fifo => a.inserted_at.cmp(&b.inserted_at),
        EvictionStrategy::Ttl => {
            // expired first
            let a_expired = a.is_expired(now);
            let b_expired = b.is_expired(now);
            b_expired
                .cmp(&a_expired)
                .then_with(|| a.access_count.cmp(&b.access_count))
        }
    }
}
