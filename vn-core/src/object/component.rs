//! # Component 模块
//!
//! 挂在 `GameObject` 上的行为单元。
//!
//! ## 生命周期
//!
//! ```text
//! add_component ──► setup（每个组件只调用一次）──► update × N ──► dispose
//! ```
//!
//! 组件在 `update` 期间不能直接访问对象树，而是通过 [`ComponentContext`]
//! 提交请求（销毁自身/兄弟组件、标记脏、消费输入），
//! 请求在该组件返回后、同一帧的迭代继续之前生效。

use std::any::Any;

use serde::{Deserialize, Serialize};

use super::ObjectId;
use crate::bundle::ComponentBundle;
use crate::error::BundleError;
use crate::variables::VariableStore;

/// 组件句柄
///
/// 由 `ObjectTree` 在组件加入时分配，用于移除/定位某个具体组件实例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentKey(pub(crate) u64);

impl std::fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComponentKey({})", self.0)
    }
}

/// 类型擦除辅助（用于按具体类型查找组件）
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 组件接口
///
/// 只有 [`type_name`](Component::type_name) 与 [`update`](Component::update) 必须实现，
/// 其余能力（跳过、序列化、恢复钩子）按需覆盖。
pub trait Component: AsAny {
    /// 声明的类型名（用于 `find_component` 和数据包的 `className`）
    fn type_name(&self) -> &'static str;

    /// 组件类别（用于 `components_to_data_bundle` 按类别筛选）
    fn category(&self) -> Option<&str> {
        None
    }

    /// 初始化（每个组件只调用一次）
    fn setup(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// 每帧更新
    fn update(&mut self, ctx: &mut ComponentContext<'_>);

    /// 是否支持跳过（快进动画计时器）
    fn can_skip(&self) -> bool {
        false
    }

    /// 跳过当前动画
    fn skip(&mut self) {}

    /// 销毁钩子
    fn on_dispose(&mut self) {}

    /// 导出数据包
    ///
    /// 默认返回 `NotSerializable`，导出时会被跳过。
    fn to_data_bundle(&self) -> Result<ComponentBundle, BundleError> {
        Err(BundleError::NotSerializable {
            class_name: self.type_name().to_string(),
            message: "未实现 to_data_bundle".to_string(),
        })
    }

    /// 数据包恢复后的钩子（重建临时状态）
    fn on_data_bundle_restore(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

/// 组件在对象内的存放槽
pub struct ComponentSlot {
    pub(crate) key: ComponentKey,
    pub(crate) id: Option<String>,
    pub(crate) component: Box<dyn Component>,
    pub(crate) set_up: bool,
    pub(crate) disposed: bool,
}

impl ComponentSlot {
    pub(crate) fn new(key: ComponentKey, component: Box<dyn Component>, id: Option<&str>) -> Self {
        Self {
            key,
            id: id.map(str::to_string),
            component,
            set_up: false,
            disposed: false,
        }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_set_up(&self) -> bool {
        self.set_up
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn component(&self) -> &dyn Component {
        &*self.component
    }

    pub fn component_mut(&mut self) -> &mut dyn Component {
        &mut *self.component
    }

    /// 销毁组件（幂等）
    pub(crate) fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.component.on_dispose();
        true
    }
}

impl std::fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("type_name", &self.component.type_name())
            .field("set_up", &self.set_up)
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// 组件提交的请求
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContextRequest {
    DisposeSelf,
    DisposeComponent(String),
    MarkDirty,
    ClearDirty,
    ConsumeInput,
}

/// 组件回调上下文
pub struct ComponentContext<'a> {
    object: ObjectId,
    needs_update: bool,
    input_consumed: bool,
    variables: Option<&'a mut VariableStore>,
    pub(crate) requests: Vec<ContextRequest>,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        object: ObjectId,
        needs_update: bool,
        input_consumed: bool,
        variables: Option<&'a mut VariableStore>,
    ) -> Self {
        Self {
            object,
            needs_update,
            input_consumed,
            variables,
            requests: Vec::new(),
        }
    }

    /// 所属对象
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// 所属对象在本次回调开始时是否需要更新
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// 本帧输入是否已被消费
    pub fn input_consumed(&self) -> bool {
        self.input_consumed
    }

    /// 变量存储（由场景层提供时可用）
    pub fn variables(&mut self) -> Option<&mut VariableStore> {
        self.variables.as_deref_mut()
    }

    /// 销毁当前组件
    pub fn dispose_self(&mut self) {
        self.requests.push(ContextRequest::DisposeSelf);
    }

    /// 按 id 销毁同一对象上的其他组件
    pub fn dispose_component(&mut self, id: impl Into<String>) {
        self.requests.push(ContextRequest::DisposeComponent(id.into()));
    }

    /// 标记所属对象需要更新（沿父链传播）
    pub fn mark_dirty(&mut self) {
        self.requests.push(ContextRequest::MarkDirty);
    }

    /// 清除所属对象的本地脏标记
    pub fn clear_dirty(&mut self) {
        self.requests.push(ContextRequest::ClearDirty);
    }

    /// 消费本帧输入
    pub fn consume_input(&mut self) {
        self.input_consumed = true;
        self.requests.push(ContextRequest::ConsumeInput);
    }
}
