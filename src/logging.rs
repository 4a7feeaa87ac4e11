//! # 日志配置模块
//!
//! 提供结构化日志宏（`linfo!` / `ldebug!` / `lwarn!` / `lerror!`）和日志系统初始化。
//!
//! 宏参数顺序统一为：`request_id, stage, component, operation, message, 额外字段...`

use std::env;
use std::fmt;

use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 启动与初始化
    Startup,
    /// 配置加载
    Configuration,
    /// 缓存读写
    Cache,
    /// 淘汰与过期清理
    Eviction,
    /// 缓存失效
    Invalidation,
    /// 后台任务
    BackgroundTask,
    /// 停止
    Shutdown,
}

impl LogStage {
    /// 阶段名称
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Configuration => "configuration",
            Self::Cache => "cache",
            Self::Eviction => "eviction",
            Self::Invalidation => "invalidation",
            Self::BackgroundTask => "background_task",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 日志组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 单个端点缓存
    Cache,
    /// 多端点缓存管理器
    CacheManager,
    /// 记忆化包装
    Memoize,
    /// 过期清理任务
    Sweeper,
    /// 配置模块
    Config,
}

impl LogComponent {
    /// 组件名称
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::CacheManager => "cache_manager",
            Self::Memoize => "memoize",
            Self::Sweeper => "sweeper",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// INFO 级别结构化日志
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($field:tt)+) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($field)+,
            "{}",
            $message
        )
    };
}

/// DEBUG 级别结构化日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($field:tt)+) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($field)+,
            "{}",
            $message
        )
    };
}

/// WARN 级别结构化日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($field:tt)+) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($field)+,
            "{}",
            $message
        )
    };
}

/// ERROR 级别结构化日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($field:tt)+) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($field)+,
            "{}",
            $message
        )
    };
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先；未设置时使用 `log_level`（默认 `info`），并把本库提升到 `debug`。
/// 重复调用不会 panic（已初始化时静默忽略）。
pub fn init_optimized_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let default_filter = format!("{level},api_cache=debug");
    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    let initialized = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("📋 api-cache logging initialized");
    }
}

/// 初始化测试用日志（输出到测试捕获的 writer）
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("api_cache=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_and_component_display() {
        assert_eq!(LogStage::Eviction.to_string(), "eviction");
        assert_eq!(LogComponent::CacheManager.to_string(), "cache_manager");
    }

    #[test]
    fn macros_accept_fields_and_plain_messages() {
        init_test_logging();
        let endpoint = "products";
        crate::linfo!("system", LogStage::Cache, LogComponent::Cache, "plain", "纯文本消息");
        crate::ldebug!(
            "system",
            LogStage::Eviction,
            LogComponent::Cache,
            "with_fields",
            &format!("淘汰完成: {endpoint}"),
            endpoint = endpoint,
            evicted = 3_usize
        );
        crate::lwarn!("system", LogStage::Cache, LogComponent::Memoize, "warn", "警告");
        crate::lerror!("system", LogStage::Shutdown, LogComponent::Sweeper, "error", "错误");
    }
}
