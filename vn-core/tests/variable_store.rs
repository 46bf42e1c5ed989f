//! 变量存储集成测试

use serde_json::json;
use vn_core::{
    ClearRange, ClearType, ListValue, Operand, Scope, VariableConfig, VariableError, VariableRef,
    VariableStore, VariableType,
};

fn store() -> VariableStore {
    let mut store = VariableStore::from_config(VariableConfig::default());
    store.setup("scene");
    store
}

fn refs() -> [VariableRef; 3] {
    [
        VariableRef::temp(7),
        VariableRef::global("", 7),
        VariableRef::persistent("", 7),
    ]
}

fn assert_roundtrip<T: VariableType>(store: &mut VariableStore, value: T) {
    for var in refs() {
        store.set_value_to(&var, value.clone()).unwrap();
        assert_eq!(
            store.value_of(&Operand::<T>::from(var.clone())),
            Ok(value.clone()),
            "{:?} {}",
            var.scope,
            T::KIND
        );
    }
}

#[test]
fn test_roundtrip_every_scope_and_kind() {
    let mut store = store();
    assert_roundtrip(&mut store, 42.5);
    assert_roundtrip(&mut store, "台词".to_string());
    assert_roundtrip(&mut store, true);
    assert_roundtrip::<ListValue>(&mut store, vec![json!(1), json!("a")]);
}

#[test]
fn test_named_accessors() {
    let mut store = store();
    let var = VariableRef::global("", 1);
    store.set_number_value_to(&var, 3.0).unwrap();
    store.set_string_value_to(&var, "x".into()).unwrap();
    store.set_boolean_value_to(&var, true).unwrap();
    store.set_list_value_to(&var, vec![json!(null)]).unwrap();

    assert_eq!(store.number_value_at_index(Scope::Global, 1, ""), Ok(3.0));
    assert_eq!(store.string_value_at_index(Scope::Global, 1, ""), Ok("x".to_string()));
    assert_eq!(store.boolean_value_at_index(Scope::Global, 1, ""), Ok(true));
    assert_eq!(
        store.list_value_at_index(Scope::Global, 1, ""),
        Ok(vec![json!(null)])
    );
}

#[test]
fn test_domain_isolation() {
    let mut store = VariableStore::new(VariableConfig::default());
    store.setup_domains(&["A", "B"]);

    store
        .set_number_value_to(&VariableRef::global("A", 5), 9.0)
        .unwrap();
    assert_eq!(
        store.number_value_of(&VariableRef::global("B", 5).into()),
        Ok(0.0)
    );
    assert_eq!(
        store.number_value_of(&VariableRef::global("A", 5).into()),
        Ok(9.0)
    );
}

#[test]
fn test_clear_global_inclusive_range() {
    let mut store = store();
    for index in 0..8 {
        store
            .set_number_value_at_index(Scope::Global, index, 1.0, "")
            .unwrap();
    }
    let clear_type: ClearType = serde_json::from_value(json!(2)).unwrap();
    store.clear_global_variables(clear_type, Some(ClearRange::new(3, 5)));

    let values: Vec<f64> = (0..8)
        .map(|i| store.number_value_at_index(Scope::Global, i, "").unwrap())
        .collect();
    assert_eq!(values, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn test_clear_persistent_by_type() {
    let mut store = store();
    store
        .set_number_value_at_index(Scope::Persistent, 0, 1.0, "")
        .unwrap();
    store
        .set_boolean_value_at_index(Scope::Persistent, 0, true, "")
        .unwrap();

    store.clear_persistent_variables(ClearType::Booleans, None);
    assert_eq!(store.number_value_at_index(Scope::Persistent, 0, ""), Ok(1.0));
    assert_eq!(store.boolean_value_at_index(Scope::Persistent, 0, ""), Ok(false));
}

#[test]
fn test_context_values_survive_switch() {
    let mut store = VariableStore::from_config(VariableConfig::default());
    store.setup("A");
    store.set_number_value_to(&VariableRef::temp(0), 1.0).unwrap();

    store.setup("B");
    assert_eq!(store.number_value_of(&VariableRef::temp(0).into()), Ok(0.0));
    store.set_number_value_to(&VariableRef::temp(0), 2.0).unwrap();

    store.setup("A");
    assert_eq!(store.number_value_of(&VariableRef::temp(0).into()), Ok(1.0));
    assert_eq!(store.local_variables("B").unwrap().get::<f64>(0), 2.0);
}

#[test]
fn test_clear_local_single_context() {
    let mut store = VariableStore::from_config(VariableConfig::default());
    store.setup("A");
    store.set_string_value_to(&VariableRef::temp(2), "a".into()).unwrap();
    store.setup("B");
    store.set_string_value_to(&VariableRef::temp(2), "b".into()).unwrap();

    store.clear_local_variables(Some("A"), ClearType::All, None);
    assert!(store.local_variables("A").unwrap().is_empty());
    assert_eq!(
        store.string_value_at_index(Scope::Temp, 2, ""),
        Ok("b".to_string())
    );
}

#[test]
fn test_mod_domain_scenario() {
    let mut store = VariableStore::new(VariableConfig::default());
    store.setup_domains(&["", "mod.example"]);

    let var: VariableRef =
        serde_json::from_value(json!({ "scope": 1, "domain": "mod.example", "index": 0 })).unwrap();
    store.set_number_value_to(&var, 42.0).unwrap();
    assert_eq!(store.number_value_of(&var.clone().into()), Ok(42.0));

    store.change_domain("");
    assert_eq!(store.domain(), "");
    assert_eq!(store.number_value_at_index(Scope::Global, 0, ""), Ok(0.0));
    assert_eq!(store.global_variables().unwrap().get::<f64>(0), 0.0);

    store.change_domain("mod.example");
    assert_eq!(store.global_variables().unwrap().get::<f64>(0), 42.0);
}

#[test]
fn test_capacity_is_enforced() {
    let mut store = store();
    let capacity = store.config().global_capacity;
    assert!(matches!(
        store.set_number_value_at_index(Scope::Global, capacity, 1.0, ""),
        Err(VariableError::OutOfRange { .. })
    ));
}

#[test]
fn test_json_operand_resolution() {
    let mut store = store();
    store
        .set_number_value_to(&VariableRef::persistent("", 3), 5.0)
        .unwrap();

    let reference = json!({ "scope": 2, "index": 3 });
    assert_eq!(store.number_value_of_json(&reference), Ok(5.0));
    assert_eq!(store.string_value_of_json(&reference), Ok(String::new()));
    assert_eq!(store.number_value_of_json(&json!("7")), Ok(7.0));
    assert_eq!(store.boolean_value_of_json(&json!(1)), Ok(true));
}
