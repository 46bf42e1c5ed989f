//! 对象标识符

use serde::{Deserialize, Serialize};

/// 对象唯一标识符
///
/// 由 `ObjectTree` 在对象创建时分配，使用内部计数器生成，不会重复。
/// 与对象的可选字符串 `id`（用于全局按名查找）是两回事。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub(crate) u64);

impl ObjectId {
    /// 创建新的对象 ID（仅供 ObjectTree 内部使用）
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}
