//! # Demo 模块
//!
//! 无界面宿主使用的示例场景：一个消息窗口和一个帧计数器。
//!
//! 变量约定：
//! - 临时数值 0：消息已显示的字符数
//! - 全局数值 0：当前存档累计运行的帧数
//! - 持久数值 0：进入场景的总次数（跨存档）

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use vn_core::{
    BundleError, Component, ComponentBundle, ComponentContext, ComponentFactory, GameObject,
    ObjectId, ResourceLoader, SceneDirector, VariableRef,
};

/// 逐字显示文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageWindow {
    pub text: String,
    /// 每帧显示的字符数
    pub speed: usize,
    #[serde(default)]
    pub revealed: usize,
    /// 窗口底图
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MessageWindow {
    pub const CLASS_NAME: &'static str = "MessageWindow";

    pub fn new(text: impl Into<String>, speed: usize) -> Self {
        Self {
            text: text.into(),
            speed,
            revealed: 0,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    fn total(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_finished(&self) -> bool {
        self.revealed >= self.total()
    }

    /// 已显示的文本
    pub fn visible_text(&self) -> String {
        self.text.chars().take(self.revealed).collect()
    }
}

impl Component for MessageWindow {
    fn type_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn category(&self) -> Option<&str> {
        Some("message")
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        if self.is_finished() {
            return;
        }
        self.revealed = (self.revealed + self.speed).min(self.total());
        let revealed = self.revealed as f64;
        if let Some(vars) = ctx.variables()
            && let Err(e) = vars.set_number_value_to(&VariableRef::temp(0), revealed)
        {
            debug!(error = %e, "写入显示进度失败");
        }
        ctx.mark_dirty();
    }

    fn can_skip(&self) -> bool {
        !self.is_finished()
    }

    fn skip(&mut self) {
        self.revealed = self.total();
    }

    fn to_data_bundle(&self) -> Result<ComponentBundle, BundleError> {
        ComponentBundle::from_serializable(Self::CLASS_NAME, self)
    }
}

/// 统计运行帧数
#[derive(Debug, Default)]
pub struct FrameCounter;

impl FrameCounter {
    pub const CLASS_NAME: &'static str = "FrameCounter";
}

impl Component for FrameCounter {
    fn type_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn setup(&mut self, ctx: &mut ComponentContext<'_>) {
        bump(ctx, &VariableRef::persistent("", 0));
    }

    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        bump(ctx, &VariableRef::global("", 0));
        ctx.clear_dirty();
    }

    fn to_data_bundle(&self) -> Result<ComponentBundle, BundleError> {
        Ok(ComponentBundle::new(Self::CLASS_NAME))
    }
}

fn bump(ctx: &mut ComponentContext<'_>, var: &VariableRef) {
    let Some(vars) = ctx.variables() else {
        return;
    };
    let result = vars
        .number_value_of(&var.clone().into())
        .and_then(|value| vars.set_number_value_to(var, value + 1.0));
    if let Err(e) = result {
        debug!(error = %e, "计数失败");
    }
}

/// 示例场景用到的组件工厂
pub fn demo_factory() -> ComponentFactory {
    let mut factory = ComponentFactory::new();
    factory.register_serde::<MessageWindow>(MessageWindow::CLASS_NAME);
    factory.register(FrameCounter::CLASS_NAME, |_: &ComponentBundle| {
        Ok(Box::new(FrameCounter) as Box<dyn Component>)
    });
    factory
}

/// 在当前场景中搭建示例对象树，返回根对象
pub fn build_demo_scene(director: &mut SceneDirector, text: &str) -> vn_core::CoreResult<ObjectId> {
    let root = director.spawn_root(GameObject::new().with_id("stage"));
    let tree = director.tree_mut();

    let counter = tree.create(GameObject::new().with_id("counter").with_order(-1));
    tree.add_component(counter, Box::new(FrameCounter))?;

    let window = tree.create(GameObject::new().with_id("message").with_group("ui"));
    tree.add_component_with_id(
        window,
        Box::new(MessageWindow::new(text, 2).with_image("ui/window.png")),
        "printer",
    )?;

    tree.add_object(root, window)?;
    tree.add_object(root, counter)?;
    Ok(root)
}

/// 只记录请求的资源加载器
#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub requested: Vec<String>,
}

impl ResourceLoader for RecordingLoader {
    fn load(&mut self, path: &str) {
        trace!(path, "请求资源");
        self.requested.push(path.to_string());
    }
}
