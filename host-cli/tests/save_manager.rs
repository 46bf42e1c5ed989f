//! 存档文件管理测试

use host_cli::demo::{MessageWindow, build_demo_scene, demo_factory};
use host_cli::{HostConfig, SaveManager};
use tempfile::TempDir;
use vn_core::{
    CoreConfig, PersistentData, SaveData, SaveError, SceneDirector, VariableBundle, VariableRef,
};

fn manager() -> (TempDir, SaveManager) {
    let dir = TempDir::new().unwrap();
    let manager = SaveManager::new(dir.path().join("saves"));
    (dir, manager)
}

#[test]
fn test_save_and_load() {
    let (_dir, manager) = manager();
    let data = SaveData::new(1, VariableBundle::default()).with_scene("title");

    manager.save(&data).unwrap();
    assert!(manager.exists(1));

    let loaded = manager.load(1).unwrap();
    assert_eq!(loaded.metadata.slot, 1);
    assert_eq!(loaded.metadata.scene.as_deref(), Some("title"));
}

#[test]
fn test_slot_not_found() {
    let (_dir, manager) = manager();
    assert!(matches!(manager.load(99), Err(SaveError::NotFound(_))));
    assert!(manager.get_save_info(99).is_none());
}

#[test]
fn test_list_and_next_slot() {
    let (_dir, manager) = manager();
    assert!(manager.list_saves().is_empty());

    for slot in [1, 3, 5] {
        manager
            .save(&SaveData::new(slot, VariableBundle::default()))
            .unwrap();
    }
    manager
        .save_persistent(&PersistentData::default())
        .unwrap();

    let slots: Vec<u32> = manager.list_saves().into_iter().map(|(s, _)| s).collect();
    assert_eq!(slots, vec![1, 3, 5]);
    assert_eq!(manager.next_available_slot(), Some(2));

    manager.delete(1).unwrap();
    manager.delete(1).unwrap();
    assert_eq!(manager.next_available_slot(), Some(1));
}

#[test]
fn test_persistent_survives_new_game() {
    let (_dir, manager) = manager();
    assert_eq!(manager.load_persistent().unwrap(), PersistentData::default());

    let mut director = SceneDirector::new(&CoreConfig::default());
    director.change_scene("title");
    build_demo_scene(&mut director, "hi").unwrap();
    director.update_frame();
    manager
        .save_persistent(&PersistentData::new(director.variables().persistent_bundle()))
        .unwrap();

    let mut next = SceneDirector::new(&CoreConfig::default());
    next.variables_mut()
        .restore_persistent(manager.load_persistent().unwrap().variables);
    next.change_scene("title");
    build_demo_scene(&mut next, "hi").unwrap();
    next.update_frame();

    let vars = next.variables();
    assert_eq!(vars.number_value_of(&VariableRef::persistent("", 0).into()), Ok(2.0));
    assert_eq!(vars.number_value_of(&VariableRef::global("", 0).into()), Ok(1.0));
}

#[test]
fn test_demo_scene_save_roundtrip() {
    let (_dir, manager) = manager();
    let mut director = SceneDirector::new(&CoreConfig::default());
    director.change_scene("chapter1");
    build_demo_scene(&mut director, "abcdef").unwrap();
    director.update_frame();
    manager.save(&director.save(4).unwrap()).unwrap();

    let info = manager.get_save_info(4).unwrap();
    assert_eq!(info.scene.as_deref(), Some("chapter1"));
    assert_eq!(info.objects, 1);

    let mut restored = SceneDirector::new(&CoreConfig::default());
    restored.load(&manager.load(4).unwrap(), &demo_factory()).unwrap();

    let tree = restored.tree();
    let message = tree.object_by_id("message").unwrap();
    let window = tree.find_component_of::<MessageWindow>(message).unwrap();
    assert_eq!(window.revealed, 2);
    assert_eq!(window.image.as_deref(), Some("ui/window.png"));
    assert_eq!(
        restored
            .variables()
            .number_value_of(&VariableRef::temp(0).into()),
        Ok(2.0)
    );
}

#[test]
fn test_host_config_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let missing = HostConfig::load(&path);
    assert_eq!(missing, HostConfig::default());

    let mut config = HostConfig::default();
    config.frames = 12;
    config.save(&path).unwrap();
    assert_eq!(HostConfig::load(&path).frames, 12);

    std::fs::write(&path, "{ not json").unwrap();
    assert_eq!(HostConfig::load(&path), HostConfig::default());
}
