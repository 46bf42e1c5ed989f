//! # VN Core
//!
//! Visual Novel Engine 的状态核心：对象层级与变量存储。
//!
//! ## 架构概述
//!
//! `vn-core` 是纯逻辑库，不做任何 IO。宿主层（Host）负责读写文件、
//! 驱动帧循环，并实现资源加载：
//!
//! ```text
//! Host                                 Core
//!   │── change_scene / update_frame ──►│ SceneDirector
//!   │                                   │   ├── ObjectTree（对象 + 组件）
//!   │                                   │   └── VariableStore（临时 / 全局 / 持久）
//!   │◄──────── SaveData / PersistentData│
//! ```
//!
//! ## 核心类型
//!
//! - [`ObjectTree`]：持有全部 [`GameObject`]，负责挂接、更新与脏标记传播
//! - [`Component`]：挂在对象上的行为单元
//! - [`VariableStore`]：三种作用域、四种变量的存储
//! - [`SceneDirector`]：场景切换与帧循环
//! - [`SaveData`] / [`PersistentData`]：存档数据模型
//!
//! ## 模块结构
//!
//! - [`dirty`]：脏标记属性与强制更新条件
//! - [`object`]：对象、组件、对象管理器
//! - [`bundle`]：对象/组件数据包与组件工厂
//! - [`variables`]：变量引用、变量集、变量存储
//! - [`save`]：存档数据模型
//! - [`scene`]：场景调度
//! - [`resource`]：资源路径收集与预加载
//! - [`config`]：核心配置
//! - [`error`]：错误类型定义

pub mod bundle;
pub mod config;
pub mod dirty;
pub mod error;
pub mod object;
pub mod resource;
pub mod save;
pub mod scene;
pub mod variables;

// 重导出核心类型
pub use bundle::{ComponentBundle, ComponentFactory, ObjectBundle};
pub use config::{ConfigError, CoreConfig, ObjectConfig, VariableConfig};
pub use dirty::{Dirty, ElementPoint, NeverForce, PreparingFlag, UpdateCondition};
pub use error::{BundleError, CoreError, CoreResult, ObjectError, VariableError};
pub use object::{
    AsAny, Component, ComponentContext, ComponentKey, ComponentSlot, GameObject, NoopManager,
    ObjectId, ObjectManager, ObjectRegistry, ObjectTree,
};
pub use resource::{ResourceLoader, collect_bundle_paths, collect_resource_paths, preload};
pub use save::{PersistentData, SaveData, SaveError, SaveMetadata, SaveVersion};
pub use scene::SceneDirector;
pub use variables::{
    ClearRange, ClearType, DomainKey, ListValue, Operand, PersistentBundle, Scope, VariableBundle,
    VariableKind, VariableRef, VariableSet, VariableStore, VariableType,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let mut tree = ObjectTree::new();
        let _root = tree.create(GameObject::new().with_id("root"));

        let mut store = VariableStore::from_config(VariableConfig::default());
        store.setup("main");
        let _value = store.number_value_of(&Operand::literal(1.0));

        let _director = SceneDirector::new(&CoreConfig::default());
        let _clear = (ClearType::All, ClearRange::new(0, 9));
    }
}
