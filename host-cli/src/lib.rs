//! # Host CLI
//!
//! 无界面宿主：负责配置、日志、存档文件，并驱动 `vn-core` 的帧循环。
//!
//! ## 模块结构
//!
//! - [`config`]：宿主配置（config.json）
//! - [`save_manager`]：存档槽位与持久变量文件
//! - [`demo`]：示例场景与资源加载器

pub mod config;
pub mod demo;
pub mod save_manager;

pub use config::{ConfigError, ConfigFallback, HostConfig};
pub use save_manager::{MAX_SAVE_SLOTS, PERSISTENT_FILE, SaveInfo, SaveManager};
