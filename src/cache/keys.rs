//! # 缓存键生成
//!
//! 由端点名和参数对象生成确定性的缓存键，格式为 `"<endpoint>:<json>"`。
//! 顶层参数键按字典序排序，因此调用方构造参数对象的插入顺序不影响命中。
//!
//! 嵌套对象不会被本模块重新排序；在 `serde_json` 默认的有序 `Map` 表示下，
//! 嵌套对象会按键序输出，但若依赖图开启了 `preserve_order`，嵌套对象将保持插入顺序。
//! 用深层参数对象区分缓存时请注意这一点。

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ApiCacheError, Result};

/// 缓存键参数：字符串键到任意 JSON 值的映射
pub type CacheKeyParams = Map<String, Value>;

/// 生成缓存键
///
/// 未提供参数时按空对象 `{}` 处理。
#[must_use]
pub fn generate_key(endpoint: &str, params: Option<&CacheKeyParams>) -> String {
    let mut sorted: Vec<(&String, &Value)> = params.map_or_else(Vec::new, |p| p.iter().collect());
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut canonical = Map::new();
    for (key, value) in sorted {
        canonical.insert(key.clone(), value.clone());
    }

    format!("{endpoint}:{}", Value::Object(canonical))
}

/// 由任意可序列化参数生成缓存键
///
/// - 对象：与 [`generate_key`] 相同的规则
/// - `null`：视为未提供参数
/// - 其他 JSON 值（数字、字符串、数组）：原样输出其 JSON 表示
///
/// 无法表示为 JSON 的参数（例如非字符串键的 map）立即返回
/// [`ApiCacheError::KeyGeneration`]，避免悄悄产生键冲突。
pub fn try_generate_key<P>(endpoint: &str, params: &P) -> Result<String>
where
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(params).map_err(|e| {
        ApiCacheError::key_generation_with_source(
            format!("端点 {endpoint} 的缓存参数无法序列化为 JSON"),
            e,
        )
    })?;

    Ok(match value {
        Value::Object(map) => generate_key(endpoint, Some(&map)),
        Value::Null => generate_key(endpoint, None),
        other => format!("{endpoint}:{other}"),
    })
}

/// 缓存键构建器
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    endpoint: String,
    params: CacheKeyParams,
}

impl CacheKeyBuilder {
    /// 以端点名创建构建器
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: CacheKeyParams::new(),
        }
    }

    /// 添加参数
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 添加可选参数，`None` 时跳过
    #[must_use]
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// 生成缓存键
    #[must_use]
    pub fn build(&self) -> String {
        generate_key(&self.endpoint, Some(&self.params))
    }
}
