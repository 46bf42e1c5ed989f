//! # Bundle 模块
//!
//! 对象/组件数据包：存档时导出，读档时通过注册的工厂重建。
//!
//! ## 数据格式
//!
//! ```json
//! {
//!   "id": "message_box",
//!   "group": "ui",
//!   "order": 10,
//!   "active": true,
//!   "components": [
//!     { "className": "TextPrinter", "componentId": "printer", "speed": 2 }
//!   ],
//!   "subObjects": []
//! }
//! ```
//!
//! 组件字段与 `className` 平铺在同一层，工厂按 `className` 查找构造函数。

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BundleError;
use crate::object::Component;

/// 组件数据包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBundle {
    /// 组件类名（工厂查找键）
    #[serde(rename = "className")]
    pub class_name: String,

    /// 组件在对象内的 id
    #[serde(
        rename = "componentId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub component_id: Option<String>,

    /// 其余字段
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ComponentBundle {
    /// 创建空字段的数据包
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            component_id: None,
            fields: Map::new(),
        }
    }

    /// 从可序列化的组件数据创建
    ///
    /// 数据必须序列化为 JSON 对象。
    pub fn from_serializable<T: Serialize>(
        class_name: impl Into<String>,
        data: &T,
    ) -> Result<Self, BundleError> {
        let class_name = class_name.into();
        match serde_json::to_value(data) {
            Ok(Value::Object(fields)) => Ok(Self {
                class_name,
                component_id: None,
                fields,
            }),
            Ok(other) => Err(BundleError::NotSerializable {
                class_name,
                message: format!("期望 JSON 对象，实际为 {}", json_kind(&other)),
            }),
            Err(e) => Err(BundleError::NotSerializable {
                class_name,
                message: e.to_string(),
            }),
        }
    }

    /// 将字段还原为具体类型
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, BundleError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            BundleError::InvalidFields {
                class_name: self.class_name.clone(),
                message: e.to_string(),
            }
        })
    }

    /// 设置组件 id
    pub fn with_component_id(mut self, id: impl Into<String>) -> Self {
        self.component_id = Some(id.into());
        self
    }

    /// 设置单个字段
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 对象数据包
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub components: Vec<ComponentBundle>,
    #[serde(default)]
    pub sub_objects: Vec<ObjectBundle>,
}

fn default_active() -> bool {
    true
}

impl Default for ObjectBundle {
    fn default() -> Self {
        Self {
            id: None,
            group: None,
            order: 0,
            active: true,
            components: Vec::new(),
            sub_objects: Vec::new(),
        }
    }
}

/// 组件构造函数
pub type ComponentConstructor =
    Box<dyn Fn(&ComponentBundle) -> Result<Box<dyn Component>, BundleError>>;

/// 组件工厂
///
/// 启动时注册 `className -> 构造函数`，读档时据此重建组件。
#[derive(Default)]
pub struct ComponentFactory {
    constructors: HashMap<String, ComponentConstructor>,
}

impl ComponentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册构造函数（同名覆盖）
    pub fn register<F>(&mut self, class_name: impl Into<String>, constructor: F)
    where
        F: Fn(&ComponentBundle) -> Result<Box<dyn Component>, BundleError> + 'static,
    {
        self.constructors
            .insert(class_name.into(), Box::new(constructor));
    }

    /// 注册可直接由字段反序列化的组件类型
    pub fn register_serde<T>(&mut self, class_name: impl Into<String>)
    where
        T: Component + DeserializeOwned + 'static,
    {
        self.register(class_name, |bundle| {
            let component: T = bundle.to_typed()?;
            Ok(Box::new(component) as Box<dyn Component>)
        });
    }

    /// 是否注册了该类名
    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    /// 根据数据包创建组件
    pub fn create(&self, bundle: &ComponentBundle) -> Result<Box<dyn Component>, BundleError> {
        let constructor =
            self.constructors
                .get(&bundle.class_name)
                .ok_or_else(|| BundleError::UnknownClass {
                    class_name: bundle.class_name.clone(),
                })?;
        constructor(bundle)
    }
}

impl std::fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("ComponentFactory")
            .field("classes", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{AsAny, ComponentContext};

    #[derive(Debug, Serialize, Deserialize)]
    struct Blink {
        period: u32,
    }

    impl Component for Blink {
        fn type_name(&self) -> &'static str {
            "Blink"
        }

        fn update(&mut self, _ctx: &mut ComponentContext<'_>) {}
    }

    #[test]
    fn test_component_bundle_flattens_fields() {
        let bundle = ComponentBundle::from_serializable("Blink", &Blink { period: 4 })
            .unwrap()
            .with_component_id("blink");
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "className": "Blink", "componentId": "blink", "period": 4 })
        );

        let back: ComponentBundle = serde_json::from_value(json).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn test_non_object_data_is_not_serializable() {
        let result = ComponentBundle::from_serializable("Number", &5);
        assert!(matches!(result, Err(BundleError::NotSerializable { .. })));
    }

    #[test]
    fn test_factory_create() {
        let mut factory = ComponentFactory::new();
        factory.register_serde::<Blink>("Blink");
        assert!(factory.contains("Blink"));

        let bundle = ComponentBundle::new("Blink").with_field("period", 2);
        let component = factory.create(&bundle).unwrap();
        assert_eq!(component.type_name(), "Blink");
        let blink = (*component).as_any().downcast_ref::<Blink>().unwrap();
        assert_eq!(blink.period, 2);

        let bad = ComponentBundle::new("Blink").with_field("period", "fast");
        assert!(matches!(
            factory.create(&bad),
            Err(BundleError::InvalidFields { .. })
        ));

        let unknown = ComponentBundle::new("Missing");
        assert_eq!(
            factory.create(&unknown).err(),
            Some(BundleError::UnknownClass {
                class_name: "Missing".to_string()
            })
        );
    }

    #[test]
    fn test_object_bundle_defaults() {
        let bundle: ObjectBundle = serde_json::from_str("{}").unwrap();
        assert_eq!(bundle, ObjectBundle::default());
        assert!(bundle.active);
    }
}
