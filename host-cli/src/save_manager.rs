//! # SaveManager 模块
//!
//! 存档文件管理，负责存档的读写和 slot 管理。
//!
//! ## 文件布局
//!
//! ```text
//! saves/
//! ├── persistent.json   # 持久变量（与槽位无关）
//! ├── slot_001.json
//! ├── slot_002.json
//! └── ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vn_core::{PersistentData, SaveData, SaveError};

/// 最大存档槽位数
pub const MAX_SAVE_SLOTS: u32 = 99;

/// 持久变量文件名
pub const PERSISTENT_FILE: &str = "persistent.json";

/// 存档管理器
#[derive(Debug, Clone)]
pub struct SaveManager {
    /// 存档目录
    saves_dir: PathBuf,
}

impl SaveManager {
    pub fn new(saves_dir: impl AsRef<Path>) -> Self {
        let saves_dir = saves_dir.as_ref().to_path_buf();
        Self { saves_dir }
    }

    pub fn saves_dir(&self) -> &Path {
        &self.saves_dir
    }

    /// 确保存档目录存在
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        if !self.saves_dir.exists() {
            fs::create_dir_all(&self.saves_dir)
                .map_err(|e| SaveError::IoError(format!("无法创建存档目录: {}", e)))?;
        }
        Ok(())
    }

    /// 获取存档文件路径
    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.saves_dir.join(format!("slot_{:03}.json", slot))
    }

    /// 持久变量文件路径
    pub fn persistent_path(&self) -> PathBuf {
        self.saves_dir.join(PERSISTENT_FILE)
    }

    /// 保存存档
    pub fn save(&self, data: &SaveData) -> Result<(), SaveError> {
        let path = self.slot_path(data.metadata.slot);
        self.write(&path, &data.to_json()?)?;
        info!(?path, "存档保存成功");
        Ok(())
    }

    /// 读取存档
    pub fn load(&self, slot: u32) -> Result<SaveData, SaveError> {
        let path = self.slot_path(slot);
        let data = SaveData::from_json(&self.read(&path)?)?;
        info!(?path, "存档读取成功");
        Ok(data)
    }

    /// 保存持久变量
    pub fn save_persistent(&self, data: &PersistentData) -> Result<(), SaveError> {
        let path = self.persistent_path();
        self.write(&path, &data.to_json()?)?;
        debug!(?path, "持久变量保存成功");
        Ok(())
    }

    /// 读取持久变量；文件不存在时返回空数据
    pub fn load_persistent(&self) -> Result<PersistentData, SaveError> {
        let path = self.persistent_path();
        if !path.exists() {
            debug!(?path, "持久变量文件不存在");
            return Ok(PersistentData::default());
        }
        PersistentData::from_json(&self.read(&path)?)
    }

    fn write(&self, path: &Path, json: &str) -> Result<(), SaveError> {
        self.ensure_dir()?;
        fs::write(path, json)
            .map_err(|e| SaveError::IoError(format!("无法写入存档文件: {}", e)))
    }

    fn read(&self, path: &Path) -> Result<String, SaveError> {
        if !path.exists() {
            return Err(SaveError::NotFound(path.to_string_lossy().to_string()));
        }
        fs::read_to_string(path)
            .map_err(|e| SaveError::IoError(format!("无法读取存档文件: {}", e)))
    }

    /// 删除存档
    pub fn delete(&self, slot: u32) -> Result<(), SaveError> {
        let path = self.slot_path(slot);

        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| SaveError::IoError(format!("无法删除存档文件: {}", e)))?;
            info!(?path, "存档删除成功");
        }

        Ok(())
    }

    /// 检查存档是否存在
    pub fn exists(&self, slot: u32) -> bool {
        self.slot_path(slot).exists()
    }

    /// 列出所有存档（按槽位排序）
    pub fn list_saves(&self) -> Vec<(u32, PathBuf)> {
        let Ok(entries) = fs::read_dir(&self.saves_dir) else {
            return Vec::new();
        };

        let mut saves: Vec<(u32, PathBuf)> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter_map(|path| {
                let slot = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(parse_slot_file_name)?;
                Some((slot, path))
            })
            .collect();

        saves.sort_by_key(|(slot, _)| *slot);
        saves
    }

    /// 获取下一个可用的存档槽位
    pub fn next_available_slot(&self) -> Option<u32> {
        (1..=MAX_SAVE_SLOTS).find(|slot| !self.exists(*slot))
    }

    /// 获取存档信息（用于列表显示）
    pub fn get_save_info(&self, slot: u32) -> Option<SaveInfo> {
        let data = self.load(slot).ok()?;
        Some(SaveInfo {
            slot,
            timestamp: data.metadata.timestamp,
            scene: data.metadata.scene,
            objects: data.objects.len(),
        })
    }
}

/// 解析 `slot_XXX.json`
fn parse_slot_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("slot_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// 存档信息
#[derive(Debug, Clone, PartialEq)]
pub struct SaveInfo {
    pub slot: u32,
    pub timestamp: String,
    pub scene: Option<String>,
    /// 根对象数
    pub objects: usize,
}
