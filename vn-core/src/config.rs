//! # Config 模块
//!
//! 核心层配置。只描述数据，不负责读写文件（由 Host 层加载）。
//!
//! 所有字段都带默认值，配置文件中缺失的字段自动补齐。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 核心配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// 变量存储配置
    #[serde(default)]
    pub variables: VariableConfig,

    /// 对象层级配置
    #[serde(default)]
    pub objects: ObjectConfig,
}

/// 变量存储配置
///
/// 容量是每个域（或每个上下文）每种变量的索引上限。
/// 存储按需增长，容量只用于越界检查。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    /// 全局变量容量
    #[serde(default = "default_global_capacity")]
    pub global_capacity: usize,

    /// 持久变量容量
    #[serde(default = "default_persistent_capacity")]
    pub persistent_capacity: usize,

    /// 局部（临时）变量容量
    #[serde(default = "default_local_capacity")]
    pub local_capacity: usize,

    /// 启动时分配的域列表
    #[serde(default = "default_domains")]
    pub default_domains: Vec<String>,
}

/// 对象层级配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// 每帧更新前是否对标记了 `needs_sort` 的子对象排序
    #[serde(default = "default_sort_on_update")]
    pub sort_on_update: bool,
}

// 默认值函数
fn default_global_capacity() -> usize {
    1000
}

fn default_persistent_capacity() -> usize {
    500
}

fn default_local_capacity() -> usize {
    1000
}

fn default_domains() -> Vec<String> {
    vec![String::new()]
}

fn default_sort_on_update() -> bool {
    true
}

impl Default for VariableConfig {
    fn default() -> Self {
        Self {
            global_capacity: default_global_capacity(),
            persistent_capacity: default_persistent_capacity(),
            local_capacity: default_local_capacity(),
            default_domains: default_domains(),
        }
    }
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            sort_on_update: default_sort_on_update(),
        }
    }
}

impl CoreConfig {
    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let vars = &self.variables;

        if vars.global_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "global_capacity 必须大于 0".to_string(),
            ));
        }

        if vars.persistent_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "persistent_capacity 必须大于 0".to_string(),
            ));
        }

        if vars.local_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "local_capacity 必须大于 0".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for domain in &vars.default_domains {
            if !seen.insert(domain.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "default_domains 中存在重复的域: '{}'",
                    domain
                )));
            }
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoreConfig::default();
        assert_eq!(config.variables.global_capacity, 1000);
        assert_eq!(config.variables.persistent_capacity, 500);
        assert_eq!(config.variables.default_domains, vec![String::new()]);
        assert!(config.objects.sort_on_update);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "variables": { "persistent_capacity": 10 } }"#;
        let config: CoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.variables.persistent_capacity, 10);
        assert_eq!(config.variables.global_capacity, 1000);
        assert!(config.objects.sort_on_update);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CoreConfig::default();

        config.variables.global_capacity = 0;
        assert!(config.validate().is_err());

        config.variables.global_capacity = 10;
        config.variables.default_domains = vec!["a".into(), "a".into()];
        assert!(config.validate().is_err());

        config.variables.default_domains = vec!["".into(), "a".into()];
        assert!(config.validate().is_ok());
    }
}
