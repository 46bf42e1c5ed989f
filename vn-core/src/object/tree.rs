//! # Tree 模块
//!
//! 对象树：持有所有 `GameObject`，提供挂接、组件管理、生命周期与脏标记传播。
//!
//! ## 更新模型
//!
//! 主更新路径由场景层每帧自顶向下调用 [`ObjectTree::update`]。
//! [`ObjectTree::full_update`] 是少用的"先向上、再向下"路径，仅在
//! 对象状态变化同时影响祖先与子对象时使用。
//!
//! ## 销毁
//!
//! `dispose` 后对象以墓碑形式留在树中（`is_disposed` 仍可查询），
//! 直到调用 [`ObjectTree::purge_disposed`] 回收。

use std::collections::HashMap;

use tracing::{debug, trace};

use super::component::ContextRequest;
use super::{
    Component, ComponentContext, ComponentKey, ComponentSlot, GameObject, ObjectId, ObjectManager,
    ObjectRegistry,
};
use crate::bundle::{ComponentBundle, ComponentFactory, ObjectBundle};
use crate::dirty::{NeverForce, UpdateCondition};
use crate::error::{BundleError, CoreResult, ObjectError};
use crate::variables::VariableStore;

/// 子对象位置上限（`insert_object` / `set_object` 会以空位补齐到该位置）
pub const MAX_SUB_OBJECTS: usize = 4096;

/// 对象树
pub struct ObjectTree {
    /// 所有对象（含已销毁的墓碑）
    objects: HashMap<ObjectId, GameObject>,
    /// 下一个对象 ID
    next_object_id: u64,
    /// 下一个组件句柄
    next_component_key: u64,
    /// 对象管理器
    manager: Box<dyn ObjectManager>,
    /// 额外的强制更新条件
    condition: Box<dyn UpdateCondition>,
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectTree")
            .field("objects", &self.objects.len())
            .field("next_object_id", &self.next_object_id)
            .finish()
    }
}

impl ObjectTree {
    /// 使用默认的 [`ObjectRegistry`] 创建对象树
    pub fn new() -> Self {
        Self::with_manager(ObjectRegistry::new())
    }

    /// 使用指定的对象管理器创建对象树
    pub fn with_manager(manager: impl ObjectManager + 'static) -> Self {
        Self {
            objects: HashMap::new(),
            next_object_id: 1,
            next_component_key: 1,
            manager: Box::new(manager),
            condition: Box::new(NeverForce),
        }
    }

    /// 设置额外的强制更新条件
    pub fn with_update_condition(mut self, condition: impl UpdateCondition + 'static) -> Self {
        self.condition = Box::new(condition);
        self
    }

    pub fn manager(&self) -> &dyn ObjectManager {
        self.manager.as_ref()
    }

    pub fn manager_mut(&mut self) -> &mut dyn ObjectManager {
        self.manager.as_mut()
    }

    // ========== 对象管理 ==========

    /// 加入新对象
    ///
    /// 对象注册到管理器（进入未分配池），若有分组则加入分组。
    /// 全局 id 在挂接到父对象时才注册。
    pub fn create(&mut self, object: GameObject) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id += 1;

        self.manager.register_object(id);
        if let Some(group) = object.group.as_deref() {
            self.manager.add_to_group(id, group);
        }
        trace!(object = %id, name = ?object.id, "创建对象");

        self.objects.insert(id, object);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    /// 对象存在且未销毁
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.get(id).is_some_and(|o| !o.disposed)
    }

    /// 对象数量（含墓碑）
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// 按全局 id 查找对象
    pub fn object_by_id(&self, id: &str) -> Option<ObjectId> {
        self.manager.object_by_id(id)
    }

    /// 修改对象的全局 id
    pub fn set_object_id(&mut self, object: ObjectId, id: Option<&str>) -> bool {
        let Some(obj) = self.get_mut(object) else {
            return false;
        };
        obj.id = id.map(str::to_string);
        self.manager.set_object_by_id(object, id);
        true
    }

    /// 设置对象是否活动
    pub fn set_active(&mut self, object: ObjectId, active: bool) -> bool {
        match self.get_mut(object) {
            Some(obj) => {
                obj.active = active;
                true
            }
            None => false,
        }
    }

    fn require_alive(&self, id: ObjectId) -> Result<&GameObject, ObjectError> {
        let obj = self.get(id).ok_or(ObjectError::NotFound { id })?;
        if obj.disposed {
            return Err(ObjectError::Disposed { id });
        }
        Ok(obj)
    }

    fn require_alive_mut(&mut self, id: ObjectId) -> Result<&mut GameObject, ObjectError> {
        let obj = self.objects.get_mut(&id).ok_or(ObjectError::NotFound { id })?;
        if obj.disposed {
            return Err(ObjectError::Disposed { id });
        }
        Ok(obj)
    }

    // ========== 子对象 ==========

    /// 追加子对象
    pub fn add_object(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), ObjectError> {
        self.attach(parent, child, |subs, child| subs.push(Some(child)))
    }

    /// 在指定位置插入子对象
    ///
    /// 位置超出末尾时以空位补齐；位置不能超过 [`MAX_SUB_OBJECTS`]。
    pub fn insert_object(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        index: usize,
    ) -> Result<(), ObjectError> {
        check_sub_object_index(index)?;
        self.attach(parent, child, |subs, child| {
            if index > subs.len() {
                subs.resize(index, None);
            }
            subs.insert(index, Some(child));
        })
    }

    /// 将子对象放到指定位置（覆盖原有对象）
    ///
    /// 位置超出末尾时以空位补齐；被覆盖的对象失去父对象，但不会被销毁。
    pub fn set_object(
        &mut self,
        parent: ObjectId,
        child: ObjectId,
        index: usize,
    ) -> Result<(), ObjectError> {
        check_sub_object_index(index)?;
        let mut displaced = None;
        self.attach(parent, child, |subs, child| {
            if index >= subs.len() {
                subs.resize(index + 1, None);
            }
            displaced = subs[index].replace(child);
        })?;

        if let Some(old) = displaced.filter(|old| *old != child)
            && let Some(old_obj) = self.get_mut(old)
        {
            old_obj.parent = None;
        }
        Ok(())
    }

    fn attach<F>(&mut self, parent: ObjectId, child: ObjectId, place: F) -> Result<(), ObjectError>
    where
        F: FnOnce(&mut Vec<Option<ObjectId>>, ObjectId),
    {
        if parent == child {
            return Err(ObjectError::SelfParent { id: child });
        }
        self.require_alive(parent)?;
        self.require_alive(child)?;
        if self.is_ancestor(child, parent) {
            return Err(ObjectError::Cycle { parent, child });
        }

        // 1. 从原父对象与未分配池中移除
        self.detach_from_parent(child);
        self.manager.remove(child);

        // 2-3. 设置 parent 并放入子对象列表
        let child_name = {
            let child_obj = self.require_alive_mut(child)?;
            child_obj.parent = Some(parent);
            child_obj.id.clone()
        };
        let parent_obj = self.require_alive_mut(parent)?;
        place(&mut parent_obj.sub_objects, child);

        // 4. 标记脏与排序
        parent_obj.needs_sort = true;
        self.mark_dirty(parent);

        // 5. 注册全局 id
        if let Some(name) = child_name.as_deref().filter(|n| !n.is_empty()) {
            self.manager.set_object_by_id(child, Some(name));
        }

        debug!(%parent, %child, "挂接子对象");
        Ok(())
    }

    /// `ancestor` 是否是 `object` 的祖先（含自身）
    pub fn is_ancestor(&self, ancestor: ObjectId, object: ObjectId) -> bool {
        let mut current = Some(object);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|o| o.parent);
        }
        false
    }

    fn detach_from_parent(&mut self, child: ObjectId) {
        let Some(old_parent) = self.get(child).and_then(|o| o.parent) else {
            return;
        };
        if let Some(parent_obj) = self.get_mut(old_parent) {
            parent_obj.detach_child(child);
        }
        if let Some(child_obj) = self.get_mut(child) {
            child_obj.parent = None;
        }
        self.mark_dirty(old_parent);
    }

    /// 移除子对象（不销毁）
    ///
    /// 子对象不在列表中时返回 `false`。
    pub fn remove_object(&mut self, parent: ObjectId, child: ObjectId) -> bool {
        let removed = self
            .get_mut(parent)
            .is_some_and(|parent_obj| parent_obj.detach_child(child));
        if !removed {
            trace!(%parent, %child, "移除不存在的子对象");
            return false;
        }

        if let Some(child_obj) = self.get_mut(child)
            && child_obj.parent == Some(parent)
        {
            child_obj.parent = None;
        }
        self.mark_dirty(parent);
        true
    }

    /// 按位置移除子对象，保留空位（不压缩索引）
    pub fn erase_object(&mut self, parent: ObjectId, index: usize) -> Option<ObjectId> {
        let child = self
            .get_mut(parent)?
            .sub_objects
            .get_mut(index)
            .and_then(Option::take)?;

        if let Some(child_obj) = self.get_mut(child)
            && child_obj.parent == Some(parent)
        {
            child_obj.parent = None;
        }
        self.mark_dirty(parent);
        Some(child)
    }

    // ========== 排序 ==========

    /// 设置更新顺序
    ///
    /// 值变化时标记自身为脏，并要求父对象重新排序。
    pub fn set_order(&mut self, object: ObjectId, order: i32) -> bool {
        let Some(obj) = self.get_mut(object) else {
            return false;
        };
        if !obj.order.replace(order) {
            return false;
        }
        let parent = obj.parent;
        if let Some(parent_obj) = parent.and_then(|p| self.get_mut(p)) {
            parent_obj.needs_sort = true;
        }
        self.mark_dirty(object);
        true
    }

    /// 按 order 稳定排序子对象，空位排到末尾
    pub fn sort_sub_objects(&mut self, object: ObjectId) {
        let Some(obj) = self.get(object) else {
            return;
        };
        let mut keyed: Vec<(bool, i32, Option<ObjectId>)> = obj
            .sub_objects
            .iter()
            .map(|entry| match entry {
                Some(child) => (false, self.get(*child).map_or(0, |c| c.order()), *entry),
                None => (true, 0, None),
            })
            .collect();
        keyed.sort_by_key(|(hole, order, _)| (*hole, *order));

        if let Some(obj) = self.get_mut(object) {
            obj.sub_objects = keyed.into_iter().map(|(_, _, entry)| entry).collect();
            obj.needs_sort = false;
        }
    }

    // ========== 脏标记 ==========

    /// 是否需要更新（本地脏标记 || 外部条件）
    pub fn needs_update(&self, object: ObjectId) -> bool {
        self.get(object).is_some_and(|o| o.needs_update) || self.condition.forces_update()
    }

    /// 标记对象及所有祖先需要更新
    ///
    /// 只设置祖先的原始标记，不对祖先重复传播。
    pub fn mark_dirty(&mut self, object: ObjectId) {
        let mut current = Some(object);
        while let Some(id) = current {
            current = match self.get_mut(id) {
                Some(obj) => {
                    obj.needs_update = true;
                    obj.parent
                }
                None => None,
            };
        }
    }

    /// 强更新：标记祖先链，并递归标记所有后代
    pub fn mark_full_dirty(&mut self, object: ObjectId) {
        self.mark_dirty(object);
        self.full_refresh(object);
    }

    /// 清除对象的本地脏标记
    pub fn clear_dirty(&mut self, object: ObjectId) {
        if let Some(obj) = self.get_mut(object) {
            obj.needs_update = false;
        }
    }

    /// 强制对象及所有后代需要更新（例如语言切换后全部重绘）
    pub fn full_refresh(&mut self, object: ObjectId) {
        let mut stack = vec![object];
        while let Some(id) = stack.pop() {
            if let Some(obj) = self.get_mut(id) {
                obj.needs_update = true;
                stack.extend(obj.sub_objects.iter().flatten().copied());
            }
        }
    }

    // ========== 组件 ==========

    fn next_key(&mut self) -> ComponentKey {
        let key = ComponentKey(self.next_component_key);
        self.next_component_key += 1;
        key
    }

    /// 追加组件
    pub fn add_component(
        &mut self,
        object: ObjectId,
        component: Box<dyn Component>,
    ) -> Result<ComponentKey, ObjectError> {
        let len = self.require_alive(object)?.components.len();
        self.insert_component(object, component, len, None)
    }

    /// 追加带 id 的组件
    pub fn add_component_with_id(
        &mut self,
        object: ObjectId,
        component: Box<dyn Component>,
        id: &str,
    ) -> Result<ComponentKey, ObjectError> {
        let len = self.require_alive(object)?.components.len();
        self.insert_component(object, component, len, Some(id))
    }

    /// 在指定位置插入组件
    pub fn insert_component(
        &mut self,
        object: ObjectId,
        component: Box<dyn Component>,
        index: usize,
        id: Option<&str>,
    ) -> Result<ComponentKey, ObjectError> {
        let len = self.require_alive(object)?.components.len();
        if index > len {
            return Err(ObjectError::IndexOutOfBounds { index, len });
        }
        let key = self.next_key();
        trace!(%object, %key, type_name = component.type_name(), "加入组件");

        let obj = self.require_alive_mut(object)?;
        obj.components
            .insert(index, ComponentSlot::new(key, component, id));
        Ok(key)
    }

    /// 移除组件（不调用销毁钩子）
    pub fn remove_component(
        &mut self,
        object: ObjectId,
        key: ComponentKey,
    ) -> Option<Box<dyn Component>> {
        let obj = self.get_mut(object)?;
        let index = obj.components.iter().position(|slot| slot.key == key)?;
        Some(obj.components.remove(index).component)
    }

    /// 按 id 销毁组件
    pub fn dispose_component(&mut self, object: ObjectId, id: &str) -> bool {
        self.get_mut(object)
            .and_then(|obj| obj.components.iter_mut().find(|s| s.id() == Some(id)))
            .is_some_and(ComponentSlot::dispose)
    }

    fn live_slots(&self, object: ObjectId) -> impl Iterator<Item = &ComponentSlot> {
        self.get(object)
            .into_iter()
            .flat_map(|obj| obj.components.iter())
            .filter(|slot| !slot.disposed)
    }

    /// 按类型名查找第一个组件
    pub fn find_component(&self, object: ObjectId, name: &str) -> Option<&dyn Component> {
        self.live_slots(object)
            .find(|slot| slot.component.type_name() == name)
            .map(ComponentSlot::component)
    }

    /// 按类型名查找所有组件
    pub fn find_components(&self, object: ObjectId, name: &str) -> Vec<&dyn Component> {
        self.live_slots(object)
            .filter(|slot| slot.component.type_name() == name)
            .map(ComponentSlot::component)
            .collect()
    }

    /// 按 id 查找组件
    pub fn find_component_by_id(&self, object: ObjectId, id: &str) -> Option<&dyn Component> {
        self.live_slots(object)
            .find(|slot| slot.id() == Some(id))
            .map(ComponentSlot::component)
    }

    /// 按具体类型查找组件
    pub fn find_component_of<T: Component + 'static>(&self, object: ObjectId) -> Option<&T> {
        self.live_slots(object)
            .find_map(|slot| slot.component().as_any().downcast_ref::<T>())
    }

    /// 按具体类型查找组件（可变）
    pub fn find_component_of_mut<T: Component + 'static>(
        &mut self,
        object: ObjectId,
    ) -> Option<&mut T> {
        self.get_mut(object)?
            .components
            .iter_mut()
            .filter(|slot| !slot.disposed)
            .find_map(|slot| slot.component_mut().as_any_mut().downcast_mut::<T>())
    }

    // ========== 生命周期 ==========

    /// 对尚未初始化的组件调用 `setup`，并标记对象已初始化
    pub fn setup(&mut self, object: ObjectId) -> bool {
        self.run_setup(object, None)
    }

    /// 带变量存储的 `setup`
    pub fn setup_with(&mut self, object: ObjectId, variables: &mut VariableStore) -> bool {
        self.run_setup(object, Some(variables))
    }

    fn run_setup(&mut self, object: ObjectId, mut variables: Option<&mut VariableStore>) -> bool {
        if !self.is_alive(object) {
            return false;
        }
        let needs_update = self.needs_update(object);
        let Some(obj) = self.get_mut(object) else {
            return false;
        };
        let mut slots = std::mem::take(&mut obj.components);
        let mut input_consumed = obj.input_consumed;
        let mut follow_ups = Vec::new();

        for index in 0..slots.len() {
            if slots[index].set_up || slots[index].disposed {
                continue;
            }
            let mut ctx = ComponentContext::new(
                object,
                needs_update,
                input_consumed,
                variables.as_deref_mut(),
            );
            slots[index].component.setup(&mut ctx);
            slots[index].set_up = true;
            input_consumed = ctx.input_consumed();
            Self::apply_requests(&mut slots, index, ctx.requests, &mut follow_ups);
        }

        if let Some(obj) = self.get_mut(object) {
            slots.append(&mut obj.components);
            obj.components = slots;
            obj.input_consumed = input_consumed;
            obj.initialized = true;
        }
        self.apply_follow_ups(object, follow_ups);
        true
    }

    /// 更新对象的组件
    ///
    /// 对象未活动或已销毁时不做任何事（也不清除输入标记）。
    /// 已销毁的组件在迭代到时从列表中移除；组件在自身 `update` 中销毁自己或
    /// 兄弟组件，会在本帧剩余迭代中立即生效。
    pub fn update(&mut self, object: ObjectId) -> bool {
        self.run_update(object, None)
    }

    /// 带变量存储的 `update`
    pub fn update_with(&mut self, object: ObjectId, variables: &mut VariableStore) -> bool {
        self.run_update(object, Some(variables))
    }

    fn run_update(&mut self, object: ObjectId, mut variables: Option<&mut VariableStore>) -> bool {
        let needs_update = self.needs_update(object);
        let Some(obj) = self.get_mut(object) else {
            return false;
        };
        if obj.disposed || !obj.active {
            return false;
        }

        let mut slots = std::mem::take(&mut obj.components);
        let mut input_consumed = obj.input_consumed;
        let mut follow_ups = Vec::new();

        let mut index = 0;
        while index < slots.len() {
            if slots[index].disposed {
                slots.remove(index);
                continue;
            }

            let mut ctx = ComponentContext::new(
                object,
                needs_update,
                input_consumed,
                variables.as_deref_mut(),
            );
            slots[index].component.update(&mut ctx);
            input_consumed = ctx.input_consumed();
            Self::apply_requests(&mut slots, index, ctx.requests, &mut follow_ups);

            if slots[index].disposed {
                slots.remove(index);
            } else {
                index += 1;
            }
        }

        if let Some(obj) = self.get_mut(object) {
            slots.append(&mut obj.components);
            obj.components = slots;
            obj.input_consumed = false;
        }
        self.apply_follow_ups(object, follow_ups);
        true
    }

    /// 处理组件提交的请求；需要访问树的请求推迟到组件列表放回后执行
    fn apply_requests(
        slots: &mut [ComponentSlot],
        current: usize,
        requests: Vec<ContextRequest>,
        follow_ups: &mut Vec<ContextRequest>,
    ) {
        for request in requests {
            match request {
                ContextRequest::DisposeSelf => {
                    slots[current].dispose();
                }
                ContextRequest::DisposeComponent(id) => {
                    if let Some(slot) = slots.iter_mut().find(|s| s.id() == Some(id.as_str())) {
                        slot.dispose();
                    }
                }
                ContextRequest::ConsumeInput => {}
                other => follow_ups.push(other),
            }
        }
    }

    fn apply_follow_ups(&mut self, object: ObjectId, follow_ups: Vec<ContextRequest>) {
        for request in follow_ups {
            match request {
                ContextRequest::MarkDirty => self.mark_dirty(object),
                ContextRequest::ClearDirty => self.clear_dirty(object),
                _ => {}
            }
        }
    }

    /// 先沿父链向上更新每个祖先，再更新每个直接子对象
    ///
    /// 非常规路径：常规更新由场景层每帧自顶向下驱动。
    pub fn full_update(&mut self, object: ObjectId) {
        let mut ancestor = self.get(object).and_then(|o| o.parent);
        while let Some(id) = ancestor {
            self.update(id);
            ancestor = self.get(id).and_then(|o| o.parent);
        }

        let children: Vec<ObjectId> = self
            .get(object)
            .map(|o| o.children().collect())
            .unwrap_or_default();
        for child in children {
            self.update(child);
        }
    }

    /// 对所有支持跳过的组件调用 `skip`
    pub fn skip(&mut self, object: ObjectId) {
        if let Some(obj) = self.get_mut(object) {
            for slot in obj.components.iter_mut().filter(|s| !s.disposed) {
                if slot.component.can_skip() {
                    slot.component.skip();
                }
            }
        }
    }

    /// 消费本帧输入
    pub fn consume_input(&mut self, object: ObjectId) {
        if let Some(obj) = self.get_mut(object) {
            obj.input_consumed = true;
        }
    }

    /// 销毁对象（幂等）
    ///
    /// 销毁全部组件、递归销毁子对象并从管理器注销。
    /// 不会从父对象的子对象列表中移除。
    pub fn dispose(&mut self, object: ObjectId) -> bool {
        let Some(obj) = self.get_mut(object) else {
            return false;
        };
        if obj.disposed {
            trace!(%object, "重复销毁");
            return false;
        }
        obj.disposed = true;
        for slot in &mut obj.components {
            slot.dispose();
        }
        let children: Vec<ObjectId> = obj.children().collect();

        for child in children {
            self.dispose(child);
        }
        self.manager.unregister_object(object);
        debug!(%object, "销毁对象");
        true
    }

    /// 回收所有已销毁对象
    ///
    /// 存活对象中指向被回收对象的子对象条目变为空位。
    pub fn purge_disposed(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|_, obj| !obj.disposed);
        let purged = before - self.objects.len();
        if purged == 0 {
            return 0;
        }

        let alive: std::collections::HashSet<ObjectId> = self.objects.keys().copied().collect();
        for obj in self.objects.values_mut() {
            for entry in &mut obj.sub_objects {
                if entry.is_some_and(|child| !alive.contains(&child)) {
                    *entry = None;
                }
            }
            if obj.parent.is_some_and(|p| !alive.contains(&p)) {
                obj.parent = None;
            }
        }
        debug!(purged, "回收已销毁对象");
        purged
    }

    // ========== 数据包 ==========

    /// 根据组件数据包重建组件并加入对象
    pub fn components_from_data_bundle(
        &mut self,
        object: ObjectId,
        bundles: &[ComponentBundle],
        factory: &ComponentFactory,
    ) -> CoreResult<Vec<ComponentKey>> {
        self.require_alive(object)?;
        let mut keys = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let component = factory.create(bundle)?;
            let key = match bundle.component_id.as_deref() {
                Some(id) => self.add_component_with_id(object, component, id)?,
                None => self.add_component(object, component)?,
            };
            keys.push(key);
        }
        Ok(keys)
    }

    /// 导出组件数据包
    ///
    /// `category` 为 `None` 时导出全部；否则只导出类别或类型名匹配的组件。
    /// 不支持序列化的组件被跳过。
    pub fn components_to_data_bundle(
        &self,
        object: ObjectId,
        category: Option<&str>,
    ) -> Result<Vec<ComponentBundle>, BundleError> {
        let mut bundles = Vec::new();
        for slot in self.live_slots(object) {
            let component = slot.component();
            if let Some(category) = category
                && component.category() != Some(category)
                && component.type_name() != category
            {
                continue;
            }
            match component.to_data_bundle() {
                Ok(mut bundle) => {
                    if bundle.component_id.is_none() {
                        bundle.component_id = slot.id.clone();
                    }
                    bundles.push(bundle);
                }
                Err(BundleError::NotSerializable { class_name, .. }) => {
                    trace!(%object, %class_name, "跳过不可序列化的组件");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(bundles)
    }

    /// 导出对象子树
    ///
    /// 空位与已销毁的子对象不导出。
    pub fn to_data_bundle(&self, object: ObjectId) -> CoreResult<ObjectBundle> {
        let obj = self.require_alive(object)?;
        let mut sub_objects = Vec::new();
        for child in obj.children() {
            if self.is_alive(child) {
                sub_objects.push(self.to_data_bundle(child)?);
            }
        }
        Ok(ObjectBundle {
            id: obj.id.clone(),
            group: obj.group.clone(),
            order: obj.order(),
            active: obj.active,
            components: self.components_to_data_bundle(object, None)?,
            sub_objects,
        })
    }

    /// 由数据包重建对象子树
    ///
    /// 每个组件重建后调用 `on_data_bundle_restore`，最后将子树整体标记为脏。
    pub fn from_data_bundle(
        &mut self,
        bundle: &ObjectBundle,
        factory: &ComponentFactory,
    ) -> CoreResult<ObjectId> {
        let root = self.restore_subtree(bundle, factory)?;
        self.mark_full_dirty(root);
        debug!(object = %root, "数据包恢复完成");
        Ok(root)
    }

    fn restore_subtree(
        &mut self,
        bundle: &ObjectBundle,
        factory: &ComponentFactory,
    ) -> CoreResult<ObjectId> {
        let mut object = GameObject::new()
            .with_order(bundle.order)
            .with_active(bundle.active);
        object.id = bundle.id.clone();
        object.group = bundle.group.clone();
        let id = self.create(object);

        self.components_from_data_bundle(id, &bundle.components, factory)?;
        self.notify_restored(id);

        for child_bundle in &bundle.sub_objects {
            let child = self.restore_subtree(child_bundle, factory)?;
            self.add_object(id, child)?;
        }
        Ok(id)
    }

    fn notify_restored(&mut self, object: ObjectId) {
        let Some(obj) = self.get_mut(object) else {
            return;
        };
        let input_consumed = obj.input_consumed;
        for slot in obj.components.iter_mut().filter(|s| !s.disposed) {
            let mut ctx = ComponentContext::new(object, true, input_consumed, None);
            slot.component.on_data_bundle_restore(&mut ctx);
        }
    }
}

fn check_sub_object_index(index: usize) -> Result<(), ObjectError> {
    if index >= MAX_SUB_OBJECTS {
        return Err(ObjectError::SubObjectIndexOutOfRange {
            index,
            limit: MAX_SUB_OBJECTS,
        });
    }
    Ok(())
}
