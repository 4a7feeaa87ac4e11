//! # 错误处理测试

use crate::error::{ApiCacheError, Context, Result, context_error};
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = ApiCacheError::config("测试配置错误");
    assert!(matches!(err, ApiCacheError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
    assert!(err.is_caller_error());
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = ApiCacheError::config_with_source("配置文件加载失败", io_err);

    assert!(matches!(err, ApiCacheError::Config { .. }));
    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    let source = err.source().expect("config error should keep its source");
    assert!(source.to_string().contains("文件不存在"));
}

#[test]
fn test_key_generation_error_is_caller_error() {
    let err = crate::key_error!("参数 {} 无法序列化", "filters");
    assert_eq!(err.to_string(), "缓存键生成错误: 参数 filters 无法序列化");
    assert!(err.is_caller_error());

    let fetch = ApiCacheError::fetch("上游超时");
    assert!(!fetch.is_caller_error());
}

#[test]
fn test_error_context_trait() {
    let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "权限不足",
    ));

    let err = result.context("读取缓存配置失败").unwrap_err();
    assert!(matches!(err, ApiCacheError::Context { .. }));
    assert!(err.to_string().starts_with("读取缓存配置失败"));
    assert!(err.to_string().contains("IO错误"));
}

#[test]
fn test_context_preserves_caller_classification() {
    let err = context_error::<()>(ApiCacheError::config("max_size 必须大于0"), "加载端点配置")
        .unwrap_err();
    assert!(err.is_caller_error());
}

#[test]
fn test_auto_conversion_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err: ApiCacheError = io_err.into();

    assert!(matches!(err, ApiCacheError::Io { .. }));
    assert!(err.to_string().contains("IO错误: 文件操作失败"));
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: ApiCacheError = toml_err.into();

    assert!(matches!(err, ApiCacheError::Config { .. }));
    assert!(err.to_string().contains("配置错误: TOML解析失败"));
}

#[test]
fn test_ensure_config_macro() {
    fn check(max_size: usize) -> Result<usize> {
        crate::ensure_config!(max_size > 0, "max_size 必须大于0, 当前值: {}", max_size);
        Ok(max_size)
    }

    assert_eq!(check(10).unwrap(), 10);
    let err = check(0).unwrap_err();
    assert_eq!(err.to_string(), "配置错误: max_size 必须大于0, 当前值: 0");
}

#[test]
fn test_auto_conversion_from_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: ApiCacheError = json_err.into();

    assert!(matches!(err, ApiCacheError::Serialization { .. }));
    assert!(!err.is_caller_error());
}
