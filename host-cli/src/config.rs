//! # Config 模块
//!
//! 宿主配置管理。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use vn_core::CoreConfig;

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 存档目录
    #[serde(default = "default_saves_dir")]
    pub saves_dir: PathBuf,

    /// 默认日志级别（`RUST_LOG` 优先）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `run` 默认执行的帧数
    #[serde(default = "default_frames")]
    pub frames: u32,

    /// 入口场景（临时变量上下文 id）
    #[serde(default = "default_start_scene")]
    pub start_scene: String,

    /// 核心配置
    #[serde(default)]
    pub core: CoreConfig,
}

// 默认值函数
fn default_saves_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_frames() -> u32 {
    60
}

fn default_start_scene() -> String {
    "title".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            saves_dir: default_saves_dir(),
            log_level: default_log_level(),
            frames: default_frames(),
            start_scene: default_start_scene(),
            core: CoreConfig::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let (config, fallback) = Self::load_or_default(path);
        match fallback {
            Some(reason) => warn!(?path, "{reason}"),
            None => info!(?path, "配置文件加载成功"),
        }
        config
    }

    /// 加载配置文件，不记录日志
    ///
    /// 回退到默认配置时一并返回原因，供日志系统初始化后再报告。
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigFallback>) {
        let path = path.as_ref();

        if !path.exists() {
            return (
                Self::default(),
                Some(ConfigFallback::Missing(path.to_path_buf())),
            );
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => (config, None),
                Err(e) => (
                    Self::default(),
                    Some(ConfigFallback::ParseFailed(e.to_string())),
                ),
            },
            Err(e) => (
                Self::default(),
                Some(ConfigFallback::ReadFailed(e.to_string())),
            ),
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_scene.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "start_scene 不能为空".to_string(),
            ));
        }

        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "无效的日志级别: '{}'",
                self.log_level
            )));
        }

        self.core
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

/// 配置回退到默认值的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigFallback {
    /// 文件不存在
    #[error("配置文件不存在，使用默认配置: {}", .0.display())]
    Missing(PathBuf),
    /// 解析失败
    #[error("配置文件解析失败，使用默认配置: {0}")]
    ParseFailed(String),
    /// 读取失败
    #[error("配置文件读取失败，使用默认配置: {0}")]
    ReadFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.saves_dir, PathBuf::from("saves"));
        assert_eq!(config.frames, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{ "frames": 5, "core": { "variables": { "global_capacity": 8 } } }"#;
        let config: HostConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.frames, 5);
        assert_eq!(config.start_scene, "title");
        assert_eq!(config.core.variables.global_capacity, 8);
        assert_eq!(config.core.variables.persistent_capacity, 500);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig::default();

        config.start_scene.clear();
        assert!(config.validate().is_err());

        config.start_scene = "title".to_string();
        config.core.variables.local_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_fallback_reason_reported() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        let (config, fallback) = HostConfig::load_or_default(&missing);
        assert_eq!(config, HostConfig::default());
        assert_eq!(fallback, Some(ConfigFallback::Missing(missing)));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ frames: ").unwrap();
        let (config, fallback) = HostConfig::load_or_default(&broken);
        assert_eq!(config, HostConfig::default());
        let reason = fallback.unwrap();
        assert!(matches!(reason, ConfigFallback::ParseFailed(_)));
        assert!(reason.to_string().contains("解析失败"));

        let valid = dir.path().join("config.json");
        fs::write(&valid, r#"{ "frames": 3 }"#).unwrap();
        let (config, fallback) = HostConfig::load_or_default(&valid);
        assert_eq!(config.frames, 3);
        assert!(fallback.is_none());
    }
}
