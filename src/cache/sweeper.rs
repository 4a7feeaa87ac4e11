//! # 后台过期清理
//!
//! 惰性过期只在访问时回收条目，长期不访问的端点会一直占用内存。
//! 需要限制内存时可以启动周期清理任务，它只调用 [`ApiCacheManager::purge_expired`]。

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::manager::ApiCacheManager;
use super::memory::CacheableValue;
use crate::config::SweeperSettings;
use crate::linfo;
use crate::logging::{LogComponent, LogStage};

/// 启动周期清理任务，`shutdown` 被取消后任务退出
///
/// 必须在 tokio 运行时内调用。`period` 为零时按 1 秒处理。
pub fn spawn_expiry_sweeper<T: CacheableValue>(
    manager: Arc<ApiCacheManager<T>>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let period = if period.is_zero() {
        Duration::from_secs(1)
    } else {
        period
    };

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        linfo!(
            "system",
            LogStage::BackgroundTask,
            LogComponent::Sweeper,
            "sweeper_started",
            "过期清理任务已启动",
            interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
        );

        let mut total_purged = 0usize;
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    total_purged += manager.purge_expired();
                }
            }
        }

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::Sweeper,
            "sweeper_stopped",
            "过期清理任务已停止",
            total_purged = total_purged
        );
    })
}

/// 按配置决定是否启动清理任务，未启用时返回 `None`
pub fn spawn_from_settings<T: CacheableValue>(
    manager: Arc<ApiCacheManager<T>>,
    settings: &SweeperSettings,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    settings
        .enabled
        .then(|| spawn_expiry_sweeper(manager, settings.interval(), shutdown))
}
