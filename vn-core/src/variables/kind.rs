//! 变量种类
//!
//! 四种变量（数值、字符串、布尔、列表）共用同一套存取逻辑，
//! 差异集中在 [`VariableType`] 的实现里。

use serde_json::Value;

use super::VariableSet;

/// 列表变量的值
pub type ListValue = Vec<Value>;

/// 变量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Number,
    String,
    Boolean,
    List,
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VariableKind::Number => "number",
            VariableKind::String => "string",
            VariableKind::Boolean => "boolean",
            VariableKind::List => "list",
        };
        write!(f, "{}", name)
    }
}

/// 可存入 [`VariableSet`] 的变量类型
///
/// 默认值（`Default`）即未赋值变量的读取结果：`0` / `""` / `false` / `[]`。
pub trait VariableType: Clone + Default + PartialEq + std::fmt::Debug + 'static {
    const KIND: VariableKind;

    /// 该种类在变量集中的存储
    fn slots(set: &VariableSet) -> &Vec<Self>;

    /// 该种类在变量集中的存储（可变）
    fn slots_mut(set: &mut VariableSet) -> &mut Vec<Self>;

    /// 把指令参数中的字面量转换为该种类
    fn coerce(value: &Value) -> Self;
}

impl VariableType for f64 {
    const KIND: VariableKind = VariableKind::Number;

    fn slots(set: &VariableSet) -> &Vec<Self> {
        &set.numbers
    }

    fn slots_mut(set: &mut VariableSet) -> &mut Vec<Self> {
        &mut set.numbers
    }

    fn coerce(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => {
                let parsed = s.trim().parse::<f64>().unwrap_or_default();
                if parsed.is_nan() { 0.0 } else { parsed }
            }
            _ => 0.0,
        }
    }
}

impl VariableType for String {
    const KIND: VariableKind = VariableKind::String;

    fn slots(set: &VariableSet) -> &Vec<Self> {
        &set.strings
    }

    fn slots_mut(set: &mut VariableSet) -> &mut Vec<Self> {
        &mut set.strings
    }

    fn coerce(value: &Value) -> Self {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }
}

impl VariableType for bool {
    const KIND: VariableKind = VariableKind::Boolean;

    fn slots(set: &VariableSet) -> &Vec<Self> {
        &set.booleans
    }

    fn slots_mut(set: &mut VariableSet) -> &mut Vec<Self> {
        &mut set.booleans
    }

    fn coerce(value: &Value) -> Self {
        match value {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

impl VariableType for ListValue {
    const KIND: VariableKind = VariableKind::List;

    fn slots(set: &VariableSet) -> &Vec<Self> {
        &set.lists
    }

    fn slots_mut(set: &mut VariableSet) -> &mut Vec<Self> {
        &mut set.lists
    }

    /// 列表不做字面量转换：数组原样使用，其他值视为空列表
    fn coerce(value: &Value) -> Self {
        match value {
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_coercion() {
        assert_eq!(f64::coerce(&json!(42)), 42.0);
        assert_eq!(f64::coerce(&json!(true)), 1.0);
        assert_eq!(f64::coerce(&json!(" 3.5 ")), 3.5);
        assert_eq!(f64::coerce(&json!("abc")), 0.0);
        assert_eq!(f64::coerce(&json!(null)), 0.0);
        assert_eq!(f64::coerce(&json!([1])), 0.0);
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(String::coerce(&json!("hi")), "hi");
        assert_eq!(String::coerce(&json!(42)), "42");
        assert_eq!(String::coerce(&json!(false)), "false");
        assert_eq!(String::coerce(&json!(null)), "");
    }

    #[test]
    fn test_boolean_coercion() {
        assert!(bool::coerce(&json!(true)));
        assert!(bool::coerce(&json!(2)));
        assert!(!bool::coerce(&json!(0)));
        assert!(!bool::coerce(&json!("")));
        assert!(bool::coerce(&json!("x")));
        assert!(!bool::coerce(&json!(null)));
        assert!(bool::coerce(&json!({})));
    }

    #[test]
    fn test_list_coercion() {
        assert_eq!(ListValue::coerce(&json!([1, "a"])), vec![json!(1), json!("a")]);
        assert!(ListValue::coerce(&json!(5)).is_empty());
    }
}
