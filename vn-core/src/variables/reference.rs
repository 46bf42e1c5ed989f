//! 变量引用与操作数

use serde::{Deserialize, Serialize};

/// 变量作用域
///
/// 序列化为数字：`0` 临时、`1` 全局、`2` 持久；其他数字按临时处理。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Scope {
    /// 临时（按上下文隔离，场景切换时重置）
    #[default]
    Temp,
    /// 全局（按域隔离，随存档保存）
    Global,
    /// 持久（按域隔离，独立于存档槽位）
    Persistent,
}

impl From<u8> for Scope {
    fn from(value: u8) -> Self {
        match value {
            1 => Scope::Global,
            2 => Scope::Persistent,
            _ => Scope::Temp,
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Temp => 0,
            Scope::Global => 1,
            Scope::Persistent => 2,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Scope::Temp => "临时",
            Scope::Global => "全局",
            Scope::Persistent => "持久",
        };
        write!(f, "{}", name)
    }
}

/// 域标识
///
/// 规范形式是域名；为兼容旧数据也接受域列表中的数字下标。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainKey {
    Index(usize),
    Name(String),
}

impl Default for DomainKey {
    fn default() -> Self {
        DomainKey::Name(String::new())
    }
}

impl From<&str> for DomainKey {
    fn from(name: &str) -> Self {
        DomainKey::Name(name.to_string())
    }
}

impl From<String> for DomainKey {
    fn from(name: String) -> Self {
        DomainKey::Name(name)
    }
}

impl From<usize> for DomainKey {
    fn from(index: usize) -> Self {
        DomainKey::Index(index)
    }
}

/// 变量引用 `{ scope, domain, index }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableRef {
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub domain: DomainKey,
    pub index: usize,
}

impl VariableRef {
    pub fn new(scope: Scope, domain: impl Into<DomainKey>, index: usize) -> Self {
        Self {
            scope,
            domain: domain.into(),
            index,
        }
    }

    /// 当前上下文的临时变量
    pub fn temp(index: usize) -> Self {
        Self::new(Scope::Temp, DomainKey::default(), index)
    }

    pub fn global(domain: impl Into<DomainKey>, index: usize) -> Self {
        Self::new(Scope::Global, domain, index)
    }

    pub fn persistent(domain: impl Into<DomainKey>, index: usize) -> Self {
        Self::new(Scope::Persistent, domain, index)
    }
}

/// 操作数：变量引用或字面量
///
/// 指令参数中"数值"既可以写常量，也可以写变量引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand<T> {
    Variable(VariableRef),
    Literal(T),
}

impl<T> Operand<T> {
    pub fn literal(value: T) -> Self {
        Operand::Literal(value)
    }
}

impl<T> From<VariableRef> for Operand<T> {
    fn from(var: VariableRef) -> Self {
        Operand::Variable(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_number() {
        assert_eq!(Scope::from(0), Scope::Temp);
        assert_eq!(Scope::from(1), Scope::Global);
        assert_eq!(Scope::from(2), Scope::Persistent);
        assert_eq!(Scope::from(7), Scope::Temp);
        assert_eq!(u8::from(Scope::Persistent), 2);
    }

    #[test]
    fn test_variable_ref_wire_format() {
        let var: VariableRef =
            serde_json::from_str(r#"{ "scope": 1, "domain": "mod.example", "index": 0 }"#)
                .unwrap();
        assert_eq!(var, VariableRef::global("mod.example", 0));

        let legacy: VariableRef =
            serde_json::from_str(r#"{ "scope": 2, "domain": 1, "index": 4 }"#).unwrap();
        assert_eq!(legacy.domain, DomainKey::Index(1));

        let minimal: VariableRef = serde_json::from_str(r#"{ "index": 3 }"#).unwrap();
        assert_eq!(minimal, VariableRef::temp(3));

        insta::assert_snapshot!(
            serde_json::to_string(&VariableRef::global("mod.example", 0)).unwrap(),
            @r#"{"scope":1,"domain":"mod.example","index":0}"#
        );
    }

    #[test]
    fn test_operand_untagged() {
        let literal: Operand<f64> = serde_json::from_str("5").unwrap();
        assert_eq!(literal, Operand::Literal(5.0));

        let var: Operand<f64> = serde_json::from_str(r#"{ "scope": 0, "index": 2 }"#).unwrap();
        assert_eq!(var, Operand::Variable(VariableRef::temp(2)));

        let text: Operand<String> = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(text, Operand::literal("hello".to_string()));
    }
}
