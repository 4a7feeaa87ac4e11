//! # 错误类型定义

use thiserror::Error;

/// 缓存库主要错误类型
///
/// 缓存未命中不是错误（用 `None` 表示），这里只覆盖调用方误用、
/// 配置加载以及调用方数据获取函数返回的失败。
#[derive(Debug, Error)]
pub enum ApiCacheError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 缓存键生成错误（参数无法序列化为 JSON）
    #[error("缓存键生成错误: {message}")]
    KeyGeneration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 数据获取错误（记忆化包装或 `fetch_or_cache` 中调用方函数失败）
    #[error("数据获取错误: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附加了上下文信息的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ApiCacheError>,
    },
}

impl ApiCacheError {
    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建缓存键生成错误
    pub fn key_generation<T: Into<String>>(message: T) -> Self {
        Self::KeyGeneration {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的缓存键生成错误
    pub fn key_generation_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::KeyGeneration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建序列化错误
    pub fn serialization<T: Into<String>, E: Into<anyhow::Error>>(message: T, source: E) -> Self {
        Self::Serialization {
            message: message.into(),
            source: source.into(),
        }
    }

    /// 创建数据获取错误
    pub fn fetch<T: Into<String>>(message: T) -> Self {
        Self::Fetch {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据获取错误
    pub fn fetch_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Fetch {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 是否由调用方误用导致（配置或键参数问题）
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::Config { .. } | Self::KeyGeneration { .. } => true,
            Self::Context { source, .. } => source.is_caller_error(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for ApiCacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for ApiCacheError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for ApiCacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON序列化失败", err)
    }
}
