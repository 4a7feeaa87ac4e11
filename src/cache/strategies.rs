//! # 缓存策略
//!
//! 定义淘汰策略、单个缓存的配置以及常用数据生命周期的预设

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ApiCacheError;

// Default values for cache configuration
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_MAX_SIZE: usize = 100;

/// 淘汰策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// 最久未访问的优先淘汰
    #[default]
    Lru,
    /// 最早写入的优先淘汰
    Fifo,
    /// 已过期的优先淘汰，其余按访问次数从少到多
    Ttl,
}

impl EvictionStrategy {
    /// 策略名称
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Fifo => "fifo",
            Self::Ttl => "ttl",
        }
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionStrategy {
    type Err = ApiCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "fifo" => Ok(Self::Fifo),
            "ttl" => Ok(Self::Ttl),
            other => Err(ApiCacheError::config(format!(
                "未知的淘汰策略: {other}，可选值为 lru / fifo / ttl"
            ))),
        }
    }
}

/// 单个端点缓存的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 条目默认存活时间
    pub ttl: Duration,
    /// 触发淘汰前允许的最大条目数
    pub max_size: usize,
    /// 淘汰策略
    pub strategy: EvictionStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_size: DEFAULT_MAX_SIZE,
            strategy: EvictionStrategy::Lru,
        }
    }
}

impl CacheConfig {
    /// 创建缓存配置
    #[must_use]
    pub const fn new(ttl: Duration, max_size: usize, strategy: EvictionStrategy) -> Self {
        Self {
            ttl,
            max_size,
            strategy,
        }
    }

    /// 设置 TTL
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 设置最大条目数
    #[must_use]
    pub const fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// 设置淘汰策略
    #[must_use]
    pub const fn with_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// 预设名称（用于配置文件）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePreset {
    /// 会话类数据
    Short,
    /// 列表类数据
    Medium,
    /// 商品目录类数据
    Long,
    /// 站点设置类数据
    VeryLong,
}

impl CachePreset {
    /// 预设对应的缓存配置
    #[must_use]
    pub const fn config(self) -> CacheConfig {
        match self {
            Self::Short => CacheStrategies::SHORT,
            Self::Medium => CacheStrategies::MEDIUM,
            Self::Long => CacheStrategies::LONG,
            Self::VeryLong => CacheStrategies::VERY_LONG,
        }
    }
}

/// 预定义的缓存策略
pub struct CacheStrategies;

impl CacheStrategies {
    /// 短期缓存（1分钟）- 会话、购物车摘要等
    pub const SHORT: CacheConfig =
        CacheConfig::new(Duration::from_secs(60), 50, EvictionStrategy::Lru);

    /// 中期缓存（5分钟）- 商品列表、搜索结果等
    pub const MEDIUM: CacheConfig =
        CacheConfig::new(Duration::from_secs(5 * 60), 100, EvictionStrategy::Lru);

    /// 长期缓存（30分钟）- 商品详情、分类目录等
    pub const LONG: CacheConfig =
        CacheConfig::new(Duration::from_secs(30 * 60), 200, EvictionStrategy::Lru);

    /// 超长期缓存（24小时）- 站点设置、导航等
    pub const VERY_LONG: CacheConfig =
        CacheConfig::new(Duration::from_secs(24 * 60 * 60), 500, EvictionStrategy::Ttl);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_size, 100);
        assert_eq!(config.strategy, EvictionStrategy::Lru);
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::default()
            .with_ttl(Duration::from_secs(10))
            .with_max_size(4)
            .with_strategy(EvictionStrategy::Fifo);
        assert_eq!(config, CacheConfig::new(Duration::from_secs(10), 4, EvictionStrategy::Fifo));
    }

    #[test]
    fn test_predefined_strategies() {
        assert_eq!(CacheStrategies::SHORT.ttl.as_secs(), 60);
        assert_eq!(CacheStrategies::MEDIUM.ttl.as_secs(), 300);
        assert_eq!(CacheStrategies::LONG.max_size, 200);
        assert_eq!(CacheStrategies::VERY_LONG.strategy, EvictionStrategy::Ttl);
        assert_eq!(CachePreset::VeryLong.config(), CacheStrategies::VERY_LONG);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("LRU".parse::<EvictionStrategy>().unwrap(), EvictionStrategy::Lru);
        assert_eq!(" fifo ".parse::<EvictionStrategy>().unwrap(), EvictionStrategy::Fifo);
        assert_eq!("ttl".parse::<EvictionStrategy>().unwrap(), EvictionStrategy::Ttl);
        assert!("random".parse::<EvictionStrategy>().is_err());
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&EvictionStrategy::Fifo).unwrap();
        assert_eq!(json, "\"fifo\"");
        let preset: CachePreset = serde_json::from_str("\"very_long\"").unwrap();
        assert_eq!(preset, CachePreset::VeryLong);
    }
}
