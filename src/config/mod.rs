//! # 配置管理模块
//!
//! 处理缓存配置的加载、环境变量覆盖和验证

mod app_config;

pub use app_config::{ApiCacheSettings, CacheDefaults, EndpointCacheSettings, SweeperSettings};

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cache::EvictionStrategy;
use crate::error::{ApiCacheError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

/// 显式指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "API_CACHE_CONFIG_PATH";

/// 加载配置文件
///
/// 路径优先取 `API_CACHE_CONFIG_PATH`，否则为 `config/cache.{RUST_ENV}.toml`（`RUST_ENV` 默认 `dev`）。
/// 加载后应用 `API_CACHE_*` 环境变量覆盖并验证。
pub fn load_config() -> Result<ApiCacheSettings> {
    load_config_from(config_path(process_env))
}

/// 从指定路径加载配置文件
pub fn load_config_from(path: impl AsRef<Path>) -> Result<ApiCacheSettings> {
    load_config_with(path.as_ref(), process_env)
}

fn load_config_with<F>(path: &Path, lookup: F) -> Result<ApiCacheSettings>
where
    F: Fn(&str) -> Option<String>,
{
    if !path.exists() {
        return Err(ApiCacheError::config(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;

    let mut settings: ApiCacheSettings = toml::from_str(&content).map_err(|e| {
        ApiCacheError::config_with_source(
            format!("TOML解析失败 - 配置文件: {}", path.display()),
            e,
        )
    })?;

    apply_overrides(&mut settings, lookup)?;
    settings.validate()?;

    linfo!(
        "system",
        LogStage::Configuration,
        LogComponent::Config,
        "load_config",
        "缓存配置加载完成",
        path = %path.display(),
        endpoints = settings.endpoints.len(),
        sweeper_enabled = settings.sweeper.enabled
    );

    Ok(settings)
}

fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    let env = lookup("RUST_ENV").unwrap_or_else(|| "dev".to_string());
    PathBuf::from(format!("config/cache.{env}.toml"))
}

/// 应用环境变量覆盖
///
/// 支持的变量：`API_CACHE_DEFAULT_TTL_SECS`、`API_CACHE_DEFAULT_MAX_SIZE`、
/// `API_CACHE_DEFAULT_STRATEGY`、`API_CACHE_SWEEPER_ENABLED`、`API_CACHE_SWEEPER_INTERVAL_SECS`。
pub fn apply_env_overrides(settings: &mut ApiCacheSettings) -> Result<()> {
    apply_overrides(settings, process_env)
}

fn apply_overrides<F>(settings: &mut ApiCacheSettings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ttl_secs) = parse_override::<u64, _>(&lookup, "API_CACHE_DEFAULT_TTL_SECS")? {
        settings.defaults.ttl_secs = ttl_secs;
    }
    if let Some(max_size) = parse_override::<usize, _>(&lookup, "API_CACHE_DEFAULT_MAX_SIZE")? {
        settings.defaults.max_size = max_size;
    }
    if let Some(strategy) =
        parse_override::<EvictionStrategy, _>(&lookup, "API_CACHE_DEFAULT_STRATEGY")?
    {
        settings.defaults.strategy = strategy;
    }
    if let Some(enabled) = parse_override::<bool, _>(&lookup, "API_CACHE_SWEEPER_ENABLED")? {
        settings.sweeper.enabled = enabled;
    }
    if let Some(interval) =
        parse_override::<u64, _>(&lookup, "API_CACHE_SWEEPER_INTERVAL_SECS")?
    {
        settings.sweeper.interval_secs = interval;
    }
    Ok(())
}

fn parse_override<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };
    let parsed = value
        .trim()
        .parse::<T>()
        .map_err(|e| ApiCacheError::config(format!("环境变量 {name} 的值无效: {value} ({e})")))?;

    ldebug!(
        "system",
        LogStage::Configuration,
        LogComponent::Config,
        "env_override",
        "应用环境变量覆盖",
        variable = name,
        value = %value
    );
    Ok(Some(parsed))
}
