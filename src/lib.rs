//! # API Response Cache Library
//!
//! 客户端 API 响应缓存：按端点分区、支持 LRU / FIFO / TTL 批量淘汰、
//! 惰性过期检测、统一失效管理以及函数级记忆化。

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use cache::{
    ApiCache, ApiCacheManager, CacheConfig, CacheStats, CacheStrategies, EvictionStrategy,
    default_manager, generate_key, memoize, memoize_async, try_generate_key,
};
pub use config::ApiCacheSettings;
pub use error::{ApiCacheError, Result};
