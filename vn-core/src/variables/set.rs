//! 变量集：一个上下文或一个域下的四种变量数组

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::{ListValue, VariableType};

/// 变量集
///
/// 数组按需增长；超出当前长度的索引读作默认值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableSet {
    #[serde(default)]
    pub numbers: Vec<f64>,
    #[serde(default)]
    pub strings: Vec<String>,
    #[serde(default)]
    pub booleans: Vec<bool>,
    #[serde(default)]
    pub lists: Vec<ListValue>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取变量（未赋值时为默认值）
    pub fn get<T: VariableType>(&self, index: usize) -> T {
        T::slots(self).get(index).cloned().unwrap_or_default()
    }

    /// 写入变量（必要时增长数组）
    pub fn set<T: VariableType>(&mut self, index: usize, value: T) {
        let slots = T::slots_mut(self);
        if index >= slots.len() {
            slots.resize(index + 1, T::default());
        }
        slots[index] = value;
    }

    /// 所有数组都为空
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
            && self.strings.is_empty()
            && self.booleans.is_empty()
            && self.lists.is_empty()
    }

    /// 将指定种类的变量重置为默认值
    ///
    /// `range` 为左闭右开区间；`None` 表示全部。
    pub fn clear(&mut self, clear_type: ClearType, range: Option<Range<usize>>) {
        if clear_type.includes(ClearType::Booleans) {
            clear_slots(&mut self.booleans, range.clone());
        }
        if clear_type.includes(ClearType::Numbers) {
            clear_slots(&mut self.numbers, range.clone());
        }
        if clear_type.includes(ClearType::Strings) {
            clear_slots(&mut self.strings, range.clone());
        }
        if clear_type.includes(ClearType::Lists) {
            clear_slots(&mut self.lists, range);
        }
    }
}

fn clear_slots<T: Default>(slots: &mut Vec<T>, range: Option<Range<usize>>) {
    match range {
        None => slots.clear(),
        Some(range) => {
            let end = range.end.min(slots.len());
            for slot in slots.iter_mut().take(end).skip(range.start) {
                *slot = T::default();
            }
        }
    }
}

/// 清除类型选择器
///
/// 序列化为数字：`0` 全部、`1` 布尔、`2` 数值、`3` 字符串、`4` 列表。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClearType {
    #[default]
    All,
    Booleans,
    Numbers,
    Strings,
    Lists,
}

impl ClearType {
    fn includes(self, kind: ClearType) -> bool {
        self == ClearType::All || self == kind
    }
}

impl TryFrom<u8> for ClearType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClearType::All),
            1 => Ok(ClearType::Booleans),
            2 => Ok(ClearType::Numbers),
            3 => Ok(ClearType::Strings),
            4 => Ok(ClearType::Lists),
            other => Err(format!("无效的清除类型: {}", other)),
        }
    }
}

impl From<ClearType> for u8 {
    fn from(value: ClearType) -> Self {
        match value {
            ClearType::All => 0,
            ClearType::Booleans => 1,
            ClearType::Numbers => 2,
            ClearType::Strings => 3,
            ClearType::Lists => 4,
        }
    }
}

/// 清除范围 `{ start, end }`
///
/// **两端都包含**：`{ start: 3, end: 5 }` 清除索引 3、4、5。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearRange {
    pub start: usize,
    pub end: usize,
}

impl ClearRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 转为左闭右开区间；`start > end` 时为空区间
    pub fn to_exclusive(self) -> Range<usize> {
        self.start..self.end.saturating_add(1).max(self.start)
    }
}
