//! # 缓存模块
//!
//! 按端点分区的内存响应缓存：
//!
//! - [`ApiCache`]：单个端点的条目存储，惰性过期 + 容量超限时批量淘汰
//! - [`ApiCacheManager`]：端点名到缓存的注册表，负责按需创建、失效和统计
//! - [`generate_key`]：与参数插入顺序无关的确定性缓存键
//! - [`CacheStrategies`]：常用数据生命周期的预设配置
//! - [`memoize`] / [`memoize_async`]：按第一个参数缓存函数结果

pub mod clock;
pub mod decorator;
mod entry;
mod eviction;
pub mod keys;
mod lock;
pub mod manager;
pub mod memory;
pub mod strategies;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decorator::{AsyncMemoized, MemoArgs, Memoized, memoize, memoize_async};
pub use entry::EntryMetadata;
pub use keys::{CacheKeyBuilder, CacheKeyParams, generate_key, try_generate_key};
pub use manager::{ApiCacheManager, default_manager};
pub use memory::{ApiCache, CacheMetrics, CacheStats, CacheableValue};
pub use strategies::{CacheConfig, CachePreset, CacheStrategies, EvictionStrategy};
pub use sweeper::{spawn_expiry_sweeper, spawn_from_settings};
