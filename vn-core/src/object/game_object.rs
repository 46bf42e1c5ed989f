//! # GameObject 模块
//!
//! 对象本体：子对象列表、组件列表、生命周期与脏标记状态。
//!
//! 结构性操作（挂接、销毁、更新）需要访问其他对象，统一在
//! [`ObjectTree`](super::ObjectTree) 上进行；这里只保存数据和只读查询。

use super::{ComponentSlot, ObjectId};
use crate::dirty::Dirty;

/// 游戏对象
#[derive(Debug)]
pub struct GameObject {
    /// 全局 id（挂接时自动注册到对象管理器）
    pub(crate) id: Option<String>,
    /// 分组名
    pub(crate) group: Option<String>,
    /// 父对象（非拥有）
    pub(crate) parent: Option<ObjectId>,
    /// 子对象；`None` 是 `erase_object` 留下的空位
    pub(crate) sub_objects: Vec<Option<ObjectId>>,
    /// 组件（按更新顺序）
    pub(crate) components: Vec<ComponentSlot>,
    /// 是否参与更新
    pub(crate) active: bool,
    /// 是否已销毁（终态）
    pub(crate) disposed: bool,
    /// 更新顺序键
    pub(crate) order: Dirty<i32>,
    /// 本地脏标记
    pub(crate) needs_update: bool,
    /// 子对象需要按 order 重新排序
    pub(crate) needs_sort: bool,
    /// 是否已执行过 setup
    pub(crate) initialized: bool,
    /// 单帧输入已被消费
    pub(crate) input_consumed: bool,
}

impl Default for GameObject {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObject {
    /// 创建空对象（活动、未初始化）
    pub fn new() -> Self {
        Self {
            id: None,
            group: None,
            parent: None,
            sub_objects: Vec::new(),
            components: Vec::new(),
            active: true,
            disposed: false,
            order: Dirty::new(0),
            needs_update: false,
            needs_sort: false,
            initialized: false,
            input_consumed: false,
        }
    }

    /// 设置全局 id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// 设置分组
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// 设置更新顺序
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Dirty::new(order);
        self
    }

    /// 设置是否活动
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// 子对象列表（含空位）
    pub fn sub_objects(&self) -> &[Option<ObjectId>] {
        &self.sub_objects
    }

    /// 子对象（跳过空位）
    pub fn children(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.sub_objects.iter().flatten().copied()
    }

    pub fn components(&self) -> &[ComponentSlot] {
        &self.components
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn order(&self) -> i32 {
        self.order.value()
    }

    /// 本地脏标记（不含外部更新条件，完整判断见 `ObjectTree::needs_update`）
    pub fn is_dirty(&self) -> bool {
        self.needs_update
    }

    pub fn needs_sort(&self) -> bool {
        self.needs_sort
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// 是否有尚未 `setup` 的存活组件（包括初始化后才加入的组件）
    pub fn has_pending_setup(&self) -> bool {
        self.components
            .iter()
            .any(|slot| !slot.set_up && !slot.disposed)
    }

    pub fn input_consumed(&self) -> bool {
        self.input_consumed
    }

    /// 子对象中是否包含指定对象
    pub fn contains(&self, child: ObjectId) -> bool {
        self.sub_objects.contains(&Some(child))
    }

    pub(crate) fn detach_child(&mut self, child: ObjectId) -> bool {
        let before = self.sub_objects.len();
        self.sub_objects.retain(|entry| *entry != Some(child));
        before != self.sub_objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let obj = GameObject::new()
            .with_id("window")
            .with_group("ui")
            .with_order(3);
        assert_eq!(obj.id(), Some("window"));
        assert_eq!(obj.group(), Some("ui"));
        assert_eq!(obj.order(), 3);
        assert!(obj.is_active());
        assert!(!obj.is_disposed());
        assert!(!obj.is_initialized());
        assert!(obj.parent().is_none());
    }

    #[test]
    fn test_children_skip_holes() {
        let mut obj = GameObject::new();
        obj.sub_objects = vec![Some(ObjectId::new(1)), None, Some(ObjectId::new(3))];
        let children: Vec<_> = obj.children().collect();
        assert_eq!(children, vec![ObjectId::new(1), ObjectId::new(3)]);
        assert!(obj.contains(ObjectId::new(3)));

        assert!(obj.detach_child(ObjectId::new(1)));
        assert!(!obj.detach_child(ObjectId::new(1)));
        assert_eq!(obj.sub_objects(), &[None, Some(ObjectId::new(3))]);
    }
}
