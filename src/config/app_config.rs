//! # 缓存配置结构定义

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, CachePreset, EvictionStrategy};
use crate::ensure_config;
use crate::error::Result;

/// 缓存主配置结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiCacheSettings {
    /// 未单独配置的端点使用的默认值
    #[serde(default)]
    pub defaults: CacheDefaults,
    /// 按端点名覆盖的配置
    #[serde(default)]
    pub endpoints: HashMap<String, EndpointCacheSettings>,
    /// 后台过期清理
    #[serde(default)]
    pub sweeper: SweeperSettings,
}

/// 默认缓存参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDefaults {
    /// 默认过期时间（秒）
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// 默认最大条目数
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// 默认淘汰策略
    #[serde(default)]
    pub strategy: EvictionStrategy,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_size: default_max_size(),
            strategy: EvictionStrategy::default(),
        }
    }
}

impl CacheDefaults {
    /// 转换为运行时缓存配置
    #[must_use]
    pub const fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            Duration::from_secs(self.ttl_secs),
            self.max_size,
            self.strategy,
        )
    }
}

/// 单个端点的缓存配置
///
/// 先取 `preset`（未设置时取全局默认值）作为基础，再用显式字段逐项覆盖。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCacheSettings {
    /// 基础预设
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<CachePreset>,
    /// 过期时间（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
    /// 最大条目数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,
    /// 淘汰策略
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<EvictionStrategy>,
}

impl EndpointCacheSettings {
    /// 在 `base` 之上叠加本端点的配置
    #[must_use]
    pub fn resolve(&self, base: CacheConfig) -> CacheConfig {
        let mut config = self.preset.map_or(base, CachePreset::config);
        if let Some(ttl_secs) = self.ttl_secs {
            config.ttl = Duration::from_secs(ttl_secs);
        }
        if let Some(max_size) = self.max_size {
            config.max_size = max_size;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        config
    }
}

/// 后台过期清理配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweeperSettings {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,
    /// 清理间隔（秒）
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SweeperSettings {
    /// 清理间隔
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

const fn default_ttl_secs() -> u64 {
    300
}

const fn default_max_size() -> usize {
    100
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

impl ApiCacheSettings {
    /// 从 TOML 文本解析并验证
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 默认缓存配置
    #[must_use]
    pub const fn default_cache_config(&self) -> CacheConfig {
        self.defaults.cache_config()
    }

    /// 某个端点最终生效的缓存配置
    #[must_use]
    pub fn config_for(&self, endpoint: &str) -> CacheConfig {
        let base = self.default_cache_config();
        self.endpoints
            .get(endpoint)
            .map_or(base, |endpoint_settings| endpoint_settings.resolve(base))
    }

    /// 所有显式配置过的端点及其生效配置
    #[must_use]
    pub fn endpoint_configs(&self) -> HashMap<String, CacheConfig> {
        self.endpoints
            .keys()
            .map(|name| (name.clone(), self.config_for(name)))
            .collect()
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        ensure_config!(
            self.defaults.max_size > 0,
            "defaults.max_size 必须大于0, 当前值: {}",
            self.defaults.max_size
        );
        ensure_config!(self.defaults.ttl_secs > 0, "defaults.ttl_secs 必须大于0");

        for (name, endpoint) in &self.endpoints {
            ensure_config!(!name.trim().is_empty(), "端点名称不能为空");
            let resolved = endpoint.resolve(self.default_cache_config());
            ensure_config!(
                resolved.max_size > 0,
                "端点 {} 的 max_size 必须大于0",
                name
            );
            ensure_config!(
                !resolved.ttl.is_zero(),
                "端点 {} 的 ttl_secs 必须大于0",
                name
            );
        }

        if self.sweeper.enabled {
            ensure_config!(
                self.sweeper.interval_secs > 0,
                "启用后台清理时 sweeper.interval_secs 必须大于0"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStrategies;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = ApiCacheSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ApiCacheSettings::default());
        assert_eq!(settings.default_cache_config(), CacheConfig::default());
        assert!(!settings.sweeper.enabled);
    }

    #[test]
    fn test_endpoint_layering() {
        let settings = ApiCacheSettings::from_toml_str(
            r#"
            [defaults]
            ttl_secs = 120
            max_size = 30
            strategy = "fifo"

            [endpoints.settings]
            preset = "very_long"

            [endpoints.products]
            preset = "long"
            max_size = 50

            [endpoints.cart]
            ttl_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(settings.config_for("settings"), CacheStrategies::VERY_LONG);
        assert_eq!(
            settings.config_for("products"),
            CacheStrategies::LONG.with_max_size(50)
        );
        assert_eq!(
            settings.config_for("cart"),
            CacheConfig::new(Duration::from_secs(10), 30, EvictionStrategy::Fifo)
        );
        assert_eq!(
            settings.config_for("unknown"),
            CacheConfig::new(Duration::from_secs(120), 30, EvictionStrategy::Fifo)
        );
        assert_eq!(settings.endpoint_configs().len(), 3);
    }

    #[test]
    fn test_validation_rejects_zero_sizes() {
        let err = ApiCacheSettings::from_toml_str("[defaults]\nmax_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_size"));

        let err = ApiCacheSettings::from_toml_str("[endpoints.users]\nttl_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("users"));

        let err = ApiCacheSettings::from_toml_str(
            "[sweeper]\nenabled = true\ninterval_secs = 0\n",
        )
        .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_unknown_strategy_is_parse_error() {
        let err = ApiCacheSettings::from_toml_str("[defaults]\nstrategy = \"random\"\n").unwrap_err();
        assert!(matches!(err, crate::error::ApiCacheError::Config { .. }));
    }
}
