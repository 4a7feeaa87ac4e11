//! # 记忆化包装
//!
//! 把函数包装成带私有缓存的版本：缓存键只由**第一个参数**生成（端点名即函数名），
//! 多参数函数只按第一个参数区分结果。

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::keys::try_generate_key;
use super::memory::{ApiCache, CacheStats, CacheableValue};
use super::strategies::{CacheConfig, EvictionStrategy};
use crate::error::{ApiCacheError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};

/// 提取用于生成缓存键的第一个参数
pub trait MemoArgs {
    /// 第一个参数的类型
    type First: Serialize + ?Sized;

    /// 第一个参数
    fn first(&self) -> &Self::First;
}

macro_rules! impl_memo_args_for_tuple {
    ($first:ident $(, $rest:ident)*) => {
        impl<$first: Serialize $(, $rest)*> MemoArgs for ($first, $($rest,)*) {
            type First = $first;

            fn first(&self) -> &Self::First {
                &self.0
            }
        }
    };
}

impl_memo_args_for_tuple!(A);
impl_memo_args_for_tuple!(A, B);
impl_memo_args_for_tuple!(A, B, C);
impl_memo_args_for_tuple!(A, B, C, D);

macro_rules! impl_memo_args_for_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl MemoArgs for $ty {
                type First = Self;

                fn first(&self) -> &Self::First {
                    self
                }
            }
        )+
    };
}

impl_memo_args_for_scalar!(String, &str, u32, u64, i32, i64, usize, bool, Value);

/// 同步记忆化函数
pub struct Memoized<Args, T, F> {
    name: String,
    func: F,
    cache: ApiCache<T>,
    _args: PhantomData<fn(Args)>,
}

/// 异步记忆化函数，失败结果不缓存
pub struct AsyncMemoized<Args, T, F> {
    name: String,
    func: F,
    cache: ApiCache<T>,
    _args: PhantomData<fn(Args)>,
}

/// 记忆化同步函数
///
/// `ttl` 为 `None` 时使用默认 5 分钟；淘汰策略应用于私有缓存（默认容量 100）。
pub fn memoize<Args, T, F>(
    name: impl Into<String>,
    func: F,
    ttl: Option<Duration>,
    strategy: EvictionStrategy,
) -> Memoized<Args, T, F>
where
    Args: MemoArgs,
    T: CacheableValue,
    F: Fn(Args) -> T,
{
    let name = name.into();
    Memoized {
        cache: ApiCache::named(name.clone(), private_config(ttl, strategy)),
        name,
        func,
        _args: PhantomData,
    }
}

/// 记忆化异步可失败函数
pub fn memoize_async<Args, T, F, Fut, E>(
    name: impl Into<String>,
    func: F,
    ttl: Option<Duration>,
    strategy: EvictionStrategy,
) -> AsyncMemoized<Args, T, F>
where
    Args: MemoArgs,
    T: CacheableValue,
    F: Fn(Args) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<anyhow::Error>,
{
    let name = name.into();
    AsyncMemoized {
        cache: ApiCache::named(name.clone(), private_config(ttl, strategy)),
        name,
        func,
        _args: PhantomData,
    }
}

fn private_config(ttl: Option<Duration>, strategy: EvictionStrategy) -> CacheConfig {
    let config = CacheConfig::default().with_strategy(strategy);
    match ttl {
        Some(ttl) => config.with_ttl(ttl),
        None => config,
    }
}

impl<Args, T, F> Memoized<Args, T, F>
where
    Args: MemoArgs,
    T: CacheableValue,
    F: Fn(Args) -> T,
{
    /// 调用被包装的函数
    ///
    /// 仅当第一个参数无法序列化为 JSON 时返回错误。
    pub fn call(&self, args: Args) -> Result<T> {
        let key = try_generate_key(&self.name, args.first())?;
        if let Some(hit) = self.cache.get(&key) {
            log_hit(&self.name, &key);
            return Ok(hit);
        }

        log_miss(&self.name, &key);
        let value = (self.func)(args);
        self.cache.set(key, value.clone(), None);
        Ok(value)
    }

    /// 私有缓存的统计信息
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    /// 清空私有缓存
    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl<Args, T, F, Fut, E> AsyncMemoized<Args, T, F>
where
    Args: MemoArgs,
    T: CacheableValue,
    F: Fn(Args) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<anyhow::Error>,
{
    /// 调用被包装的异步函数
    pub async fn call(&self, args: Args) -> Result<T> {
        let key = try_generate_key(&self.name, args.first())?;
        if let Some(hit) = self.cache.get(&key) {
            log_hit(&self.name, &key);
            return Ok(hit);
        }

        log_miss(&self.name, &key);
        match (self.func)(args).await {
            Ok(value) => {
                self.cache.set(key, value.clone(), None);
                Ok(value)
            }
            Err(e) => {
                let err = ApiCacheError::fetch_with_source(
                    format!("{} 执行失败，结果未缓存", self.name),
                    e,
                );
                lwarn!(
                    "system",
                    LogStage::Cache,
                    LogComponent::Memoize,
                    "memoize_call_failed",
                    &err.to_string(),
                    function = %self.name,
                    key = %key
                );
                Err(err)
            }
        }
    }

    /// 私有缓存的统计信息
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    /// 清空私有缓存
    pub fn clear(&self) {
        self.cache.clear();
    }
}

fn log_hit(name: &str, key: &str) {
    ldebug!(
        "system",
        LogStage::Cache,
        LogComponent::Memoize,
        "memoize_hit",
        "缓存命中",
        function = name,
        key = key
    );
}

fn log_miss(name: &str, key: &str) {
    ldebug!(
        "system",
        LogStage::Cache,
        LogComponent::Memoize,
        "memoize_miss",
        "缓存未命中，执行原函数",
        function = name,
        key = key
    );
}

impl<Args, T, F> std::fmt::Debug for Memoized<Args, T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<Args, T, F> std::fmt::Debug for AsyncMemoized<Args, T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncMemoized")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
