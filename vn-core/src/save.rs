//! # Save 模块
//!
//! 存档/读档系统的数据模型。
//!
//! ## 设计原则
//!
//! - 所有存档数据必须可序列化（JSON）
//! - 必须有版本号，支持向后兼容检测
//! - 槽位存档不包含持久变量；持久变量单独存为 [`PersistentData`]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bundle::ObjectBundle;
use crate::variables::{PersistentBundle, VariableBundle};

/// 存档格式版本
///
/// 版本号含义：
/// - MAJOR: 不兼容的格式变更
/// - MINOR: 向后兼容的新字段
pub const SAVE_VERSION_MAJOR: u32 = 1;
pub const SAVE_VERSION_MINOR: u32 = 0;

/// 存档版本信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveVersion {
    pub major: u32,
    pub minor: u32,
}

impl SaveVersion {
    /// 当前版本
    pub fn current() -> Self {
        Self {
            major: SAVE_VERSION_MAJOR,
            minor: SAVE_VERSION_MINOR,
        }
    }

    /// 检查是否兼容
    ///
    /// major 必须相同，minor 可以不同。
    pub fn is_compatible(&self) -> bool {
        self.major == SAVE_VERSION_MAJOR
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// 存档元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    /// 存档槽位号（1-based）
    pub slot: u32,
    /// 保存时间（Unix 时间戳，秒）
    pub timestamp: String,
    /// 存档时所在场景（上下文 id）
    #[serde(default)]
    pub scene: Option<String>,
    /// 游戏时长（秒）
    #[serde(default)]
    pub play_time_secs: u64,
}

impl SaveMetadata {
    pub fn new(slot: u32) -> Self {
        Self {
            slot,
            timestamp: unix_timestamp(),
            scene: None,
            play_time_secs: 0,
        }
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    pub fn with_play_time(mut self, secs: u64) -> Self {
        self.play_time_secs = secs;
        self
    }
}

/// 槽位存档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// 存档格式版本
    pub version: SaveVersion,
    /// 存档元数据
    pub metadata: SaveMetadata,
    /// 全局与局部变量
    pub variables: VariableBundle,
    /// 场景根对象
    #[serde(default)]
    pub objects: Vec<ObjectBundle>,
}

impl SaveData {
    pub fn new(slot: u32, variables: VariableBundle) -> Self {
        Self {
            version: SaveVersion::current(),
            metadata: SaveMetadata::new(slot),
            variables,
            objects: Vec::new(),
        }
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.metadata.scene = Some(scene.into());
        self
    }

    pub fn with_objects(mut self, objects: Vec<ObjectBundle>) -> Self {
        self.objects = objects;
        self
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, SaveError> {
        to_pretty_json(self)
    }

    /// 从 JSON 字符串反序列化
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let data: SaveData = from_versioned_json(json)?;
        check_version(&data.version)?;
        Ok(data)
    }
}

/// 与存档槽位无关的持久变量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentData {
    pub version: SaveVersion,
    #[serde(flatten)]
    pub variables: PersistentBundle,
}

impl PersistentData {
    pub fn new(variables: PersistentBundle) -> Self {
        Self {
            version: SaveVersion::current(),
            variables,
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        to_pretty_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let data: PersistentData = from_versioned_json(json)?;
        check_version(&data.version)?;
        Ok(data)
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, SaveError> {
    serde_json::to_string_pretty(value).map_err(|e| SaveError::SerializationFailed(e.to_string()))
}

fn from_versioned_json<T: DeserializeOwned>(json: &str) -> Result<T, SaveError> {
    serde_json::from_str(json).map_err(|e| SaveError::DeserializationFailed(e.to_string()))
}

fn check_version(version: &SaveVersion) -> Result<(), SaveError> {
    if !version.is_compatible() {
        return Err(SaveError::IncompatibleVersion {
            save_version: version.to_string(),
            current_version: SaveVersion::current().to_string(),
        });
    }
    Ok(())
}

/// 存档错误
#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// 序列化失败
    SerializationFailed(String),
    /// 反序列化失败
    DeserializationFailed(String),
    /// 版本不兼容
    IncompatibleVersion {
        save_version: String,
        current_version: String,
    },
    /// 文件操作失败
    IoError(String),
    /// 存档不存在
    NotFound(String),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::SerializationFailed(e) => write!(f, "序列化失败: {}", e),
            SaveError::DeserializationFailed(e) => write!(f, "反序列化失败: {}", e),
            SaveError::IncompatibleVersion {
                save_version,
                current_version,
            } => {
                write!(
                    f,
                    "存档版本不兼容: 存档版本 {} vs 当前版本 {}",
                    save_version, current_version
                )
            }
            SaveError::IoError(e) => write!(f, "文件操作失败: {}", e),
            SaveError::NotFound(path) => write!(f, "存档不存在: {}", path),
        }
    }
}

impl std::error::Error for SaveError {}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_secs().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariableConfig;
    use crate::variables::{Scope, VariableStore};

    #[test]
    fn test_save_version_compatibility() {
        assert!(SaveVersion::current().is_compatible());
        assert!(SaveVersion { major: 1, minor: 7 }.is_compatible());
        assert!(!SaveVersion { major: 2, minor: 0 }.is_compatible());
        assert_eq!(SaveVersion { major: 1, minor: 3 }.to_string(), "1.3");
    }

    #[test]
    fn test_save_data_excludes_persistent() {
        let mut store = VariableStore::from_config(VariableConfig::default());
        store.setup("title");
        store
            .set_number_value_at_index(Scope::Global, 0, 3.0, "")
            .unwrap();
        store
            .set_number_value_at_index(Scope::Persistent, 0, 9.0, "")
            .unwrap();

        let json = SaveData::new(1, store.save_bundle())
            .with_scene("title")
            .to_json()
            .unwrap();
        assert!(!json.contains("persistent"));

        let loaded = SaveData::from_json(&json).unwrap();
        assert_eq!(loaded.metadata.slot, 1);
        assert_eq!(loaded.metadata.scene.as_deref(), Some("title"));
        assert_eq!(loaded.variables.globals[""].numbers, vec![3.0]);
    }

    #[test]
    fn test_persistent_data_roundtrip() {
        let mut store = VariableStore::from_config(VariableConfig::default());
        store
            .set_boolean_value_at_index(Scope::Persistent, 2, true, "")
            .unwrap();

        let json = PersistentData::new(store.persistent_bundle()).to_json().unwrap();
        let loaded = PersistentData::from_json(&json).unwrap();
        assert_eq!(loaded.variables, store.persistent_bundle());
    }

    #[test]
    fn test_incompatible_version_error() {
        let json = r#"{
            "version": { "major": 99, "minor": 0 },
            "metadata": { "slot": 1, "timestamp": "0" },
            "variables": {}
        }"#;
        let result = SaveData::from_json(json);
        assert!(matches!(result, Err(SaveError::IncompatibleVersion { .. })));

        let result = PersistentData::from_json(r#"{ "version": { "major": 0, "minor": 1 } }"#);
        assert!(matches!(result, Err(SaveError::IncompatibleVersion { .. })));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SaveData::from_json("not json"),
            Err(SaveError::DeserializationFailed(_))
        ));
    }
}
