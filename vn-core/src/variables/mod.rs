//! # Variables 模块
//!
//! 变量系统：三种作用域（临时 / 全局 / 持久）× 四种变量（数值 / 字符串 / 布尔 / 列表）。
//!
//! - [`VariableRef`]：指令中的变量引用 `{ scope, domain, index }`
//! - [`Operand`]：变量引用或字面量
//! - [`VariableSet`]：一个上下文或一个域下的变量数组
//! - [`VariableStore`]：按域、按上下文组织的变量存储

mod bundle;
mod kind;
mod reference;
mod set;
mod store;

pub use bundle::{PersistentBundle, VariableBundle};
pub use kind::{ListValue, VariableKind, VariableType};
pub use reference::{DomainKey, Operand, Scope, VariableRef};
pub use set::{ClearRange, ClearType, VariableSet};
pub use store::VariableStore;
