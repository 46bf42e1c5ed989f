//! # Resource 模块
//!
//! 资源预加载：从对象数据包中收集资源路径并交给加载器。
//!
//! 真正的读文件/解码由 Host 层实现 [`ResourceLoader`]。

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::bundle::ObjectBundle;
use crate::error::CoreResult;
use crate::object::{ObjectId, ObjectTree};

/// 直接视为资源路径的字段名
const RESOURCE_KEYS: &[&str] = &["image", "sound", "video", "resource", "path"];

/// 资源加载器
pub trait ResourceLoader {
    /// 请求加载资源（可以只登记，稍后异步完成）
    fn load(&mut self, path: &str);
}

/// 字段名是否表示资源路径：固定名称或以 `Path` 结尾
fn is_resource_key(key: &str) -> bool {
    RESOURCE_KEYS.contains(&key) || (key.len() > 4 && key.ends_with("Path"))
}

/// 收集 JSON 中资源字段下的字符串路径
///
/// 递归遍历对象与数组；空字符串忽略；按首次出现顺序去重。
pub fn collect_resource_paths(value: &Value) -> Vec<String> {
    let mut collector = PathCollector::default();
    collector.visit(value);
    collector.paths
}

/// 收集对象子树数据包中引用的资源路径
pub fn collect_bundle_paths(bundle: &ObjectBundle) -> Vec<String> {
    let mut collector = PathCollector::default();
    collector.visit_bundle(bundle);
    collector.paths
}

/// 把对象子树引用的资源交给加载器，返回请求数
pub fn preload(
    tree: &ObjectTree,
    root: ObjectId,
    loader: &mut dyn ResourceLoader,
) -> CoreResult<usize> {
    let bundle = tree.to_data_bundle(root)?;
    let paths = collect_bundle_paths(&bundle);
    for path in &paths {
        loader.load(path);
    }
    debug!(object = %root, count = paths.len(), "预加载资源");
    Ok(paths.len())
}

#[derive(Default)]
struct PathCollector {
    seen: HashSet<String>,
    paths: Vec<String>,
}

impl PathCollector {
    fn push(&mut self, path: &str) {
        if !path.is_empty() && self.seen.insert(path.to_string()) {
            self.paths.push(path.to_string());
        }
    }

    fn visit(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    if is_resource_key(key) {
                        self.visit_resource(child);
                    } else {
                        self.visit(child);
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|item| self.visit(item)),
            _ => {}
        }
    }

    /// 资源字段的值：字符串直接收集，字符串数组逐项收集，对象继续遍历
    fn visit_resource(&mut self, value: &Value) {
        match value {
            Value::String(path) => self.push(path),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(path) => self.push(path),
                        other => self.visit(other),
                    }
                }
            }
            other => self.visit(other),
        }
    }

    fn visit_bundle(&mut self, bundle: &ObjectBundle) {
        for component in &bundle.components {
            for (key, value) in &component.fields {
                if is_resource_key(key) {
                    self.visit_resource(value);
                } else {
                    self.visit(value);
                }
            }
        }
        for child in &bundle.sub_objects {
            self.visit_bundle(child);
        }
    }
}
