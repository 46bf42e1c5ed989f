//! # Error 模块
//!
//! 定义 vn-core 中使用的错误类型。
//!
//! ## 错误分类
//!
//! - **编程错误**（挂接已销毁对象、形成父子环、变量索引越过容量上限、
//!   无活动上下文时写临时变量）：返回 `Err`
//! - **可预期的动态情况**（按 id 查找不存在的对象、组件不存在、重复销毁、
//!   移除不存在的子对象）：返回 `Option` / `bool`，不视为错误

use thiserror::Error;

use crate::object::ObjectId;
use crate::variables::Scope;

/// 对象层级错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
    /// 对象不存在（从未创建或已被回收）
    #[error("对象 {id} 不存在")]
    NotFound { id: ObjectId },

    /// 对象已销毁，不能再被挂接或复用
    #[error("对象 {id} 已销毁")]
    Disposed { id: ObjectId },

    /// 挂接会形成环（子对象是父对象的祖先）
    #[error("不能将 {child} 挂接到 {parent} 下：{child} 是 {parent} 的祖先")]
    Cycle { parent: ObjectId, child: ObjectId },

    /// 对象不能成为自身的子对象
    #[error("对象 {id} 不能成为自身的子对象")]
    SelfParent { id: ObjectId },

    /// 组件插入位置越界
    #[error("组件插入位置 {index} 越界，当前组件数 {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// 子对象位置超过上限
    #[error("子对象位置 {index} 超过上限 {limit}")]
    SubObjectIndexOutOfRange { index: usize, limit: usize },
}

/// 变量存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VariableError {
    /// 变量索引超出配置容量
    #[error("{scope} 变量索引 {index} 越界，容量为 {capacity}")]
    OutOfRange {
        scope: Scope,
        index: usize,
        capacity: usize,
    },

    /// 访问临时变量时没有活动上下文
    #[error("没有活动的变量上下文，请先调用 setup")]
    NoActiveContext,
}

/// 数据包（反）序列化错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BundleError {
    /// 工厂中未注册的组件类名
    #[error("未注册的组件类型 '{class_name}'")]
    UnknownClass { class_name: String },

    /// 字段无法还原为组件
    #[error("组件 '{class_name}' 的字段无效: {message}")]
    InvalidFields { class_name: String, message: String },

    /// 组件不支持序列化
    #[error("组件 '{class_name}' 不支持序列化: {message}")]
    NotSerializable { class_name: String, message: String },
}

/// vn-core 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// 对象层级错误
    #[error("对象错误: {0}")]
    Object(#[from] ObjectError),

    /// 变量错误
    #[error("变量错误: {0}")]
    Variable(#[from] VariableError),

    /// 数据包错误
    #[error("数据包错误: {0}")]
    Bundle(#[from] BundleError),
}

/// Result 类型别名
pub type CoreResult<T> = Result<T, CoreError>;
