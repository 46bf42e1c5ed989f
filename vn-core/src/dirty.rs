//! # Dirty 模块
//!
//! 脏标记属性：值变化时通知所有者链"需要更新"。
//!
//! ## 约定
//!
//! - `Dirty::replace` 只在新值与旧值不同时写入并返回 `true`，相同值是无操作
//! - 属性本身不持有所有者引用；调用方在 `replace` 返回 `true` 后
//!   通过 [`ObjectTree::mark_dirty`](crate::object::ObjectTree::mark_dirty) 沿父链传播
//! - "需要更新"除了本地标记外，还受 [`UpdateCondition`] 影响（例如场景准备阶段）

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// 脏标记属性
///
/// 包装一个值，并记录它自上次 [`Dirty::take_changed`] 以来是否被修改过。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dirty<T> {
    value: T,
    #[serde(skip)]
    changed: bool,
}

impl<T: PartialEq> Dirty<T> {
    /// 创建属性（初始为未修改）
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }

    /// 获取当前值
    pub fn get(&self) -> &T {
        &self.value
    }

    /// 设置新值
    ///
    /// 返回值是否真的发生了变化。
    pub fn replace(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.changed = true;
        true
    }

    /// 自上次读取以来是否被修改过
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// 读取并清除修改标记
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

impl<T: Copy + PartialEq> Dirty<T> {
    /// 获取当前值的副本
    pub fn value(&self) -> T {
        self.value
    }
}

/// 额外的"强制需要更新"条件
///
/// 对象的 `needs_update` = 本地脏标记 || 条件成立。
pub trait UpdateCondition {
    /// 条件是否成立
    fn forces_update(&self) -> bool;
}

/// 从不强制更新
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverForce;

impl UpdateCondition for NeverForce {
    fn forces_update(&self) -> bool {
        false
    }
}

/// 场景准备标记
///
/// 场景准备期间所有对象都视为需要更新。
/// 克隆共享同一个标记，由场景层置位/清除。
#[derive(Debug, Clone, Default)]
pub struct PreparingFlag(Rc<Cell<bool>>);

impl PreparingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, preparing: bool) {
        self.0.set(preparing);
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

impl UpdateCondition for PreparingFlag {
    fn forces_update(&self) -> bool {
        self.is_set()
    }
}

/// UI 元素坐标点
///
/// 脏标记模式的最小示例：任一坐标变化时 `set` 返回 `true`，
/// 调用方据此标记所属对象。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPoint {
    pub x: Dirty<f32>,
    pub y: Dirty<f32>,
}

impl ElementPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: Dirty::new(x),
            y: Dirty::new(y),
        }
    }

    /// 设置坐标，返回是否有变化
    pub fn set(&mut self, x: f32, y: f32) -> bool {
        let x_changed = self.x.replace(x);
        let y_changed = self.y.replace(y);
        x_changed || y_changed
    }

    pub fn get(&self) -> (f32, f32) {
        (self.x.value(), self.y.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_coalesces_equal_values() {
        let mut prop = Dirty::new(3);
        assert!(!prop.replace(3));
        assert!(!prop.is_changed());

        assert!(prop.replace(4));
        assert_eq!(prop.value(), 4);
        assert!(prop.take_changed());
        assert!(!prop.is_changed());
    }

    #[test]
    fn test_preparing_flag_is_shared() {
        let flag = PreparingFlag::new();
        let condition: Box<dyn UpdateCondition> = Box::new(flag.clone());
        assert!(!condition.forces_update());

        flag.set(true);
        assert!(condition.forces_update());
        assert!(!NeverForce.forces_update());
    }

    #[test]
    fn test_element_point() {
        let mut point = ElementPoint::new(1.0, 2.0);
        assert!(!point.set(1.0, 2.0));
        assert!(point.set(1.0, 5.0));
        assert_eq!(point.get(), (1.0, 5.0));
    }

    #[test]
    fn test_dirty_serializes_as_value() {
        let prop = Dirty::new(7);
        assert_eq!(serde_json::to_string(&prop).unwrap(), "7");
        let back: Dirty<i32> = serde_json::from_str("9").unwrap();
        assert_eq!(back.value(), 9);
        assert!(!back.is_changed());
    }
}
