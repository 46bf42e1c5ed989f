//! 变量存档数据
//!
//! 存档槽位只保存全局与局部变量；持久变量单独保存，跨存档共享。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VariableSet;

/// 随存档槽位保存的变量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableBundle {
    /// 域列表（顺序即旧数据中的域下标）
    #[serde(default)]
    pub domains: Vec<String>,
    /// 存档时的当前域
    #[serde(default)]
    pub domain: String,
    /// 全局变量（域名 -> 变量集）
    #[serde(default)]
    pub globals: BTreeMap<String, VariableSet>,
    /// 局部变量（上下文 id -> 变量集）
    #[serde(default)]
    pub locals: BTreeMap<String, VariableSet>,
    /// 存档时的活动上下文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_context: Option<String>,
}

/// 持久变量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentBundle {
    /// 域名 -> 变量集
    #[serde(default)]
    pub persistents: BTreeMap<String, VariableSet>,
}
