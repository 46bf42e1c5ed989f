//! # Object 模块
//!
//! 游戏对象层级：对象、组件、对象管理器。
//!
//! ## 所有权模型
//!
//! ```text
//! ObjectTree (arena)
//!   ├── GameObject #1 ── components: [ComponentSlot, ...]
//!   │     └── sub_objects: [Some(#2), None, Some(#3)]
//!   └── GameObject #2 ── parent: Some(#1)
//! ```
//!
//! - 所有对象由 [`ObjectTree`] 持有，以 [`ObjectId`] 互相引用
//! - `parent` 是非拥有的回指；子对象的生命周期由显式 `dispose` 决定
//! - 全局注册（id 索引、分组）通过 [`ObjectManager`] 能力注入

mod component;
mod game_object;
mod id;
mod manager;
mod tree;

pub use component::{AsAny, Component, ComponentContext, ComponentKey, ComponentSlot};
pub use game_object::GameObject;
pub use id::ObjectId;
pub use manager::{NoopManager, ObjectManager, ObjectRegistry};
pub use tree::{MAX_SUB_OBJECTS, ObjectTree};
