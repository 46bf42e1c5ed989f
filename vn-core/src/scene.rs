//! # Scene 模块
//!
//! 场景调度：把对象树与变量存储串起来。
//!
//! ## 帧循环
//!
//! ```text
//! change_scene(ctx) ──► 准备中（所有对象视为需要更新）──► finish_preparing
//!                                    │
//!                        update_frame × N（自顶向下）
//! ```
//!
//! 场景切换时销毁上一个场景的根对象，并为新场景激活临时变量上下文。

use tracing::{debug, info};

use crate::bundle::{ComponentFactory, ObjectBundle};
use crate::config::{CoreConfig, ObjectConfig};
use crate::dirty::PreparingFlag;
use crate::error::CoreResult;
use crate::object::{GameObject, ObjectId, ObjectTree};
use crate::save::SaveData;
use crate::variables::VariableStore;

/// 场景调度器
#[derive(Debug)]
pub struct SceneDirector {
    tree: ObjectTree,
    variables: VariableStore,
    preparing: PreparingFlag,
    config: ObjectConfig,
    /// 当前场景的根对象（按 order 排序）
    roots: Vec<ObjectId>,
    roots_need_sort: bool,
    /// 当前场景（临时变量上下文 id）
    scene: Option<String>,
    frame: u64,
}

impl SceneDirector {
    pub fn new(config: &CoreConfig) -> Self {
        let preparing = PreparingFlag::new();
        Self {
            tree: ObjectTree::new().with_update_condition(preparing.clone()),
            variables: VariableStore::from_config(config.variables.clone()),
            preparing,
            config: config.objects.clone(),
            roots: Vec::new(),
            roots_need_sort: false,
            scene: None,
            frame: 0,
        }
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ObjectTree {
        &mut self.tree
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    /// 场景准备标记（克隆共享同一个标记）
    pub fn preparing(&self) -> &PreparingFlag {
        &self.preparing
    }

    pub fn is_preparing(&self) -> bool {
        self.preparing.is_set()
    }

    pub fn scene(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// 已执行的帧数
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// 切换场景
    ///
    /// 销毁并回收上一个场景的全部对象，进入准备状态，
    /// 并为 `context_id` 激活临时变量。
    pub fn change_scene(&mut self, context_id: &str) {
        self.clear_roots();
        self.preparing.set(true);
        self.variables.setup(context_id);
        self.scene = Some(context_id.to_string());
        info!(scene = context_id, "切换场景");
    }

    /// 结束准备状态
    pub fn finish_preparing(&mut self) {
        self.preparing.set(false);
        debug!(scene = ?self.scene, "场景准备完成");
    }

    fn clear_roots(&mut self) {
        for root in std::mem::take(&mut self.roots) {
            self.tree.dispose(root);
        }
        self.tree.purge_disposed();
    }

    /// 创建根对象并加入当前场景
    pub fn spawn_root(&mut self, object: GameObject) -> ObjectId {
        let id = self.tree.create(object);
        self.add_root(id);
        id
    }

    /// 把已有对象作为根对象加入当前场景
    pub fn add_root(&mut self, object: ObjectId) {
        if !self.roots.contains(&object) {
            self.roots.push(object);
            self.roots_need_sort = true;
        }
    }

    /// 执行一帧
    ///
    /// 按 order 排序后自顶向下更新所有活动对象；尚未 `setup` 的组件先执行 `setup`。
    /// 未活动对象的整棵子树都不更新。返回本帧更新的对象数。
    pub fn update_frame(&mut self) -> usize {
        self.frame += 1;
        self.roots.retain(|root| self.tree.is_alive(*root));
        if self.config.sort_on_update && self.roots_need_sort {
            let tree = &self.tree;
            self.roots
                .sort_by_key(|root| tree.get(*root).map_or(0, GameObject::order));
            self.roots_need_sort = false;
        }

        let mut updated = 0;
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(object) = stack.pop() {
            let Some(obj) = self.tree.get(object) else {
                continue;
            };
            if obj.is_disposed() || !obj.is_active() {
                continue;
            }
            if !obj.is_initialized() || obj.has_pending_setup() {
                self.tree.setup_with(object, &mut self.variables);
            }
            if self.tree.update_with(object, &mut self.variables) {
                updated += 1;
            }

            if self.config.sort_on_update
                && self.tree.get(object).is_some_and(GameObject::needs_sort)
            {
                self.tree.sort_sub_objects(object);
            }
            if let Some(obj) = self.tree.get(object) {
                let children: Vec<ObjectId> = obj.children().collect();
                stack.extend(children.into_iter().rev());
            }
        }
        updated
    }

    /// 导出存档
    pub fn save(&self, slot: u32) -> CoreResult<SaveData> {
        let objects = self
            .roots
            .iter()
            .filter(|root| self.tree.is_alive(**root))
            .map(|root| self.tree.to_data_bundle(*root))
            .collect::<CoreResult<Vec<ObjectBundle>>>()?;

        let mut data = SaveData::new(slot, self.variables.save_bundle()).with_objects(objects);
        if let Some(scene) = &self.scene {
            data = data.with_scene(scene.clone());
        }
        Ok(data)
    }

    /// 读取存档
    ///
    /// 替换当前场景的对象与存档变量，持久变量不受影响。
    /// 恢复后进入准备状态。
    pub fn load(&mut self, data: &SaveData, factory: &ComponentFactory) -> CoreResult<()> {
        self.clear_roots();
        self.variables.restore_save_bundle(data.variables.clone());
        self.scene = data
            .metadata
            .scene
            .clone()
            .or_else(|| self.variables.active_context().map(str::to_string));
        if let Some(scene) = self.scene.clone() {
            self.variables.setup_temp_variables(&scene);
        }

        for bundle in &data.objects {
            let root = self.tree.from_data_bundle(bundle, factory)?;
            self.add_root(root);
        }
        self.preparing.set(true);
        info!(slot = data.metadata.slot, scene = ?self.scene, "读取存档");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::object::{Component, ComponentContext};
    use crate::variables::VariableRef;

    struct Logged {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Component for Logged {
        fn type_name(&self) -> &'static str {
            "Logged"
        }

        fn setup(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.log.borrow_mut().push(format!("setup:{}", self.name));
        }

        fn update(&mut self, ctx: &mut ComponentContext<'_>) {
            let dirty = if ctx.needs_update() { "dirty" } else { "clean" };
            self.log
                .borrow_mut()
                .push(format!("update:{}:{}", self.name, dirty));
            ctx.clear_dirty();
        }
    }

    fn spawn_logged(
        director: &mut SceneDirector,
        object: GameObject,
        name: &'static str,
        log: &Rc<RefCell<Vec<String>>>,
    ) -> ObjectId {
        let id = director.tree_mut().create(object);
        director
            .tree_mut()
            .add_component(
                id,
                Box::new(Logged {
                    name,
                    log: Rc::clone(log),
                }),
            )
            .unwrap();
        id
    }

    #[test]
    fn test_change_scene_activates_context() {
        let mut director = SceneDirector::new(&CoreConfig::default());
        director.change_scene("title");
        assert!(director.is_preparing());
        assert_eq!(director.scene(), Some("title"));
        assert_eq!(director.variables().active_context(), Some("title"));

        director
            .variables_mut()
            .set_number_value_to(&VariableRef::temp(0), 1.0)
            .unwrap();
        director.finish_preparing();
        assert!(!director.is_preparing());
    }

    #[test]
    fn test_change_scene_disposes_previous_roots() {
        let mut director = SceneDirector::new(&CoreConfig::default());
        director.change_scene("a");
        let root = director.spawn_root(GameObject::new());
        let child = director.tree_mut().create(GameObject::new());
        director.tree_mut().add_object(root, child).unwrap();

        director.change_scene("b");
        assert!(director.roots().is_empty());
        assert!(director.tree().get(root).is_none());
        assert!(director.tree().get(child).is_none());
    }

    #[test]
    fn test_update_frame_order_and_preparing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = SceneDirector::new(&CoreConfig::default());
        director.change_scene("map");

        let late = spawn_logged(&mut director, GameObject::new().with_order(5), "late", &log);
        let early = spawn_logged(&mut director, GameObject::new().with_order(-1), "early", &log);
        let child = spawn_logged(&mut director, GameObject::new(), "child", &log);
        director.tree_mut().add_object(late, child).unwrap();
        director.add_root(late);
        director.add_root(early);

        assert_eq!(director.update_frame(), 3);
        assert_eq!(director.roots(), &[early, late]);
        assert_eq!(
            *log.borrow(),
            vec![
                "setup:early",
                "update:early:dirty",
                "setup:late",
                "update:late:dirty",
                "setup:child",
                "update:child:dirty",
            ]
        );

        log.borrow_mut().clear();
        director.finish_preparing();
        director.update_frame();
        assert_eq!(
            *log.borrow(),
            vec!["update:early:clean", "update:late:clean", "update:child:clean"]
        );
        assert_eq!(director.frame(), 2);
    }

    #[test]
    fn test_late_component_set_up_before_first_update() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = SceneDirector::new(&CoreConfig::default());
        director.change_scene("map");

        let root = spawn_logged(&mut director, GameObject::new(), "a", &log);
        director.add_root(root);
        director.update_frame();
        director.finish_preparing();

        director
            .tree_mut()
            .add_component(
                root,
                Box::new(Logged {
                    name: "late",
                    log: Rc::clone(&log),
                }),
            )
            .unwrap();
        director.update_frame();
        director.update_frame();

        assert_eq!(
            *log.borrow(),
            vec![
                "setup:a",
                "update:a:dirty",
                "setup:late",
                "update:a:clean",
                "update:late:clean",
                "update:a:clean",
                "update:late:clean",
            ]
        );
        assert!(!director.tree().get(root).unwrap().has_pending_setup());
    }

    #[test]
    fn test_inactive_subtree_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut director = SceneDirector::new(&CoreConfig::default());
        director.change_scene("map");

        let root = spawn_logged(&mut director, GameObject::new().with_active(false), "root", &log);
        let child = spawn_logged(&mut director, GameObject::new(), "child", &log);
        director.tree_mut().add_object(root, child).unwrap();
        director.add_root(root);

        assert_eq!(director.update_frame(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_save_and_load_keeps_persistent() {
        let mut director = SceneDirector::new(&CoreConfig::default());
        director.change_scene("map");
        director.spawn_root(GameObject::new().with_id("hud").with_order(2));
        director
            .variables_mut()
            .set_number_value_to(&VariableRef::global("", 0), 4.0)
            .unwrap();
        let data = director.save(3).unwrap();

        director
            .variables_mut()
            .set_number_value_to(&VariableRef::global("", 0), 8.0)
            .unwrap();
        director
            .variables_mut()
            .set_number_value_to(&VariableRef::persistent("", 0), 1.0)
            .unwrap();
        director.change_scene("title");

        director.load(&data, &ComponentFactory::new()).unwrap();
        assert_eq!(director.scene(), Some("map"));
        assert_eq!(director.variables().active_context(), Some("map"));
        assert_eq!(
            director
                .variables()
                .number_value_of(&VariableRef::global("", 0).into()),
            Ok(4.0)
        );
        assert_eq!(
            director
                .variables()
                .number_value_of(&VariableRef::persistent("", 0).into()),
            Ok(1.0)
        );
        assert_eq!(director.roots().len(), 1);
        let root = director.tree().get(director.roots()[0]).unwrap();
        assert_eq!(root.id(), Some("hud"));
        assert_eq!(root.order(), 2);
        assert!(director.is_preparing());
    }
}
