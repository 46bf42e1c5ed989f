//! # Manager 模块
//!
//! 对象管理器能力接口与默认实现。
//!
//! `ObjectTree` 在对象创建、挂接、改名、销毁时调用这些方法。
//! 不需要全局索引时可以注入 [`NoopManager`]。

use std::collections::HashMap;

use tracing::trace;

use super::ObjectId;

/// 对象管理器
pub trait ObjectManager {
    /// 注册新对象（进入"未分配"池）
    fn register_object(&mut self, object: ObjectId);

    /// 注销对象（同时移除 id 索引与分组成员关系）
    fn unregister_object(&mut self, object: ObjectId);

    /// 设置对象的全局 id；`None` 表示清除
    fn set_object_by_id(&mut self, object: ObjectId, id: Option<&str>);

    /// 按全局 id 查找对象
    fn object_by_id(&self, id: &str) -> Option<ObjectId>;

    /// 将对象加入分组
    fn add_to_group(&mut self, object: ObjectId, group: &str);

    /// 分组内的对象（按加入顺序）
    fn objects_in_group(&self, group: &str) -> &[ObjectId];

    /// 将对象移出"未分配"池（对象被挂接到父对象时调用）
    fn remove(&mut self, object: ObjectId);
}

/// 空管理器：所有调用都是无操作
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopManager;

impl ObjectManager for NoopManager {
    fn register_object(&mut self, _object: ObjectId) {}

    fn unregister_object(&mut self, _object: ObjectId) {}

    fn set_object_by_id(&mut self, _object: ObjectId, _id: Option<&str>) {}

    fn object_by_id(&self, _id: &str) -> Option<ObjectId> {
        None
    }

    fn add_to_group(&mut self, _object: ObjectId, _group: &str) {}

    fn objects_in_group(&self, _group: &str) -> &[ObjectId] {
        &[]
    }

    fn remove(&mut self, _object: ObjectId) {}
}

/// 默认对象管理器
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    /// 已注册的对象（按注册顺序）
    registered: Vec<ObjectId>,
    /// 尚未挂接到任何父对象的对象
    unassigned: Vec<ObjectId>,
    /// 全局 id -> 对象
    by_id: HashMap<String, ObjectId>,
    /// 对象 -> 全局 id（改名时用于清除旧索引）
    ids: HashMap<ObjectId, String>,
    /// 分组名 -> 成员
    groups: HashMap<String, Vec<ObjectId>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对象是否已注册
    pub fn is_registered(&self, object: ObjectId) -> bool {
        self.registered.contains(&object)
    }

    /// 已注册的对象
    pub fn registered(&self) -> &[ObjectId] {
        &self.registered
    }

    /// 未分配池中的对象
    pub fn unassigned(&self) -> &[ObjectId] {
        &self.unassigned
    }

    fn clear_id(&mut self, object: ObjectId) {
        if let Some(old) = self.ids.remove(&object)
            && self.by_id.get(&old) == Some(&object)
        {
            self.by_id.remove(&old);
        }
    }
}

impl ObjectManager for ObjectRegistry {
    fn register_object(&mut self, object: ObjectId) {
        if self.is_registered(object) {
            return;
        }
        trace!(%object, "注册对象");
        self.registered.push(object);
        self.unassigned.push(object);
    }

    fn unregister_object(&mut self, object: ObjectId) {
        trace!(%object, "注销对象");
        self.registered.retain(|o| *o != object);
        self.unassigned.retain(|o| *o != object);
        self.clear_id(object);
        for members in self.groups.values_mut() {
            members.retain(|o| *o != object);
        }
        self.groups.retain(|_, members| !members.is_empty());
    }

    fn set_object_by_id(&mut self, object: ObjectId, id: Option<&str>) {
        self.clear_id(object);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            if let Some(previous) = self.by_id.insert(id.to_string(), object)
                && previous != object
            {
                // 同名覆盖：旧对象失去索引
                self.ids.remove(&previous);
            }
            self.ids.insert(object, id.to_string());
        }
    }

    fn object_by_id(&self, id: &str) -> Option<ObjectId> {
        self.by_id.get(id).copied()
    }

    fn add_to_group(&mut self, object: ObjectId, group: &str) {
        let members = self.groups.entry(group.to_string()).or_default();
        if !members.contains(&object) {
            members.push(object);
        }
    }

    fn objects_in_group(&self, group: &str) -> &[ObjectId] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    fn remove(&mut self, object: ObjectId) {
        self.unassigned.retain(|o| *o != object);
    }
}
