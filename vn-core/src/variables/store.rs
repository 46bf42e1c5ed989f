//! # VariableStore
//!
//! 三层作用域的变量存储。
//!
//! ## 状态
//!
//! ```text
//! Uninitialized ──setup_domains──► DomainsConfigured ──setup(context)──► ContextActive
//!                                                        ▲                    │
//!                                                        └── 场景切换时重新 setup ┘
//! ```
//!
//! - 临时变量：按上下文 id 隔离（场景或公共事件实例），同一时刻只有一个活动上下文
//! - 全局变量：按域隔离，随存档保存
//! - 持久变量：按域隔离，独立于存档槽位保存
//!
//! 所有存储都是"域名/上下文 id → [`VariableSet`]"的映射，首次写入时创建。

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, trace};

use super::bundle::{PersistentBundle, VariableBundle};
use super::{
    ClearRange, ClearType, DomainKey, ListValue, Operand, Scope, VariableRef, VariableSet,
    VariableType,
};
use crate::config::VariableConfig;
use crate::error::VariableError;

/// 变量存储
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    /// 容量配置
    config: VariableConfig,
    /// 已知的域（有序）
    domains: Vec<String>,
    /// 当前域
    domain: String,
    /// 全局变量（域名 -> 变量集）
    globals: HashMap<String, VariableSet>,
    /// 持久变量（域名 -> 变量集）
    persistents: HashMap<String, VariableSet>,
    /// 局部变量（上下文 id -> 变量集）
    locals: HashMap<String, VariableSet>,
    /// 当前活动上下文
    active_context: Option<String>,
}

/// 为四种变量生成具名访问器
macro_rules! kind_accessors {
    (
        $ty:ty,
        $set_to:ident,
        $set_at:ident,
        $value_of:ident,
        $value_of_json:ident,
        $value_at:ident
    ) => {
        pub fn $set_to(&mut self, var: &VariableRef, value: $ty) -> Result<(), VariableError> {
            self.set_value_to(var, value)
        }

        pub fn $set_at(
            &mut self,
            scope: Scope,
            index: usize,
            value: $ty,
            domain: &str,
        ) -> Result<(), VariableError> {
            self.set_value_at_index(scope, index, value, domain)
        }

        pub fn $value_of(&self, operand: &Operand<$ty>) -> Result<$ty, VariableError> {
            self.value_of(operand)
        }

        pub fn $value_of_json(&self, value: &Value) -> Result<$ty, VariableError> {
            self.value_of_json(value)
        }

        pub fn $value_at(
            &self,
            scope: Scope,
            index: usize,
            domain: &str,
        ) -> Result<$ty, VariableError> {
            self.value_at_index(scope, index, domain)
        }
    };
}

impl VariableStore {
    /// 创建空存储（尚未分配任何域）
    pub fn new(config: VariableConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// 创建存储并分配配置中的默认域
    pub fn from_config(config: VariableConfig) -> Self {
        let domains = config.default_domains.clone();
        let mut store = Self::new(config);
        store.setup_domains(domains.as_slice());
        store
    }

    pub fn config(&self) -> &VariableConfig {
        &self.config
    }

    // ========== 域 ==========

    /// 已知的域
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// 当前域
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 为每个域（重新）分配全局与持久存储
    ///
    /// 全局变量重置为空；已存在的持久变量保留（持久变量可能先于此调用被恢复）。
    /// 当前域不在新列表中时切换到列表的第一个域。
    pub fn setup_domains<S: AsRef<str>>(&mut self, domains: &[S]) {
        self.domains.clear();
        self.globals.clear();
        for domain in domains {
            let domain = domain.as_ref();
            if self.domains.iter().any(|d| d == domain) {
                continue;
            }
            self.domains.push(domain.to_string());
            self.globals.insert(domain.to_string(), VariableSet::new());
            self.persistents.entry(domain.to_string()).or_default();
        }

        if !self.domains.contains(&self.domain) {
            self.domain = self.domains.first().cloned().unwrap_or_default();
        }
        debug!(domains = ?self.domains, "分配变量域");
    }

    /// 切换当前域（首次使用时分配存储）
    pub fn change_domain(&mut self, domain: &str) {
        self.ensure_domain(domain);
        self.domain = domain.to_string();
        trace!(domain, "切换变量域");
    }

    fn ensure_domain(&mut self, domain: &str) {
        if !self.domains.iter().any(|d| d == domain) {
            self.domains.push(domain.to_string());
        }
        self.globals.entry(domain.to_string()).or_default();
        self.persistents.entry(domain.to_string()).or_default();
    }

    /// 把域标识解析为域名；未知下标解析为默认域
    pub fn resolve_domain(&self, key: &DomainKey) -> String {
        match key {
            DomainKey::Name(name) => name.clone(),
            DomainKey::Index(index) => self.domains.get(*index).cloned().unwrap_or_default(),
        }
    }

    // ========== 上下文 ==========

    /// 进入场景或公共事件时调用：分配并激活该上下文的局部变量
    pub fn setup(&mut self, context_id: &str) {
        self.setup_local_variables(context_id);
        self.setup_temp_variables(context_id);
    }

    /// 为上下文分配局部变量（已存在时不做任何事）
    pub fn setup_local_variables(&mut self, context_id: &str) {
        if !self.locals.contains_key(context_id) {
            trace!(context = context_id, "分配局部变量");
            self.locals
                .insert(context_id.to_string(), VariableSet::new());
        }
    }

    /// 将临时变量访问切换到该上下文（不存在时先分配）
    pub fn setup_temp_variables(&mut self, context_id: &str) {
        self.setup_local_variables(context_id);
        self.active_context = Some(context_id.to_string());
        trace!(context = context_id, "切换临时变量上下文");
    }

    /// 当前活动上下文
    pub fn active_context(&self) -> Option<&str> {
        self.active_context.as_deref()
    }

    /// 是否已为该上下文分配局部变量
    pub fn has_context(&self, context_id: &str) -> bool {
        self.locals.contains_key(context_id)
    }

    /// 所有已分配局部变量的上下文 id（排序后）
    pub fn context_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.locals.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    // ========== 变量集访问 ==========

    /// 当前上下文的临时变量
    pub fn temp_variables(&self) -> Option<&VariableSet> {
        self.active_context
            .as_deref()
            .and_then(|id| self.locals.get(id))
    }

    /// 指定上下文的局部变量
    pub fn local_variables(&self, context_id: &str) -> Option<&VariableSet> {
        self.locals.get(context_id)
    }

    /// 当前域的全局变量
    pub fn global_variables(&self) -> Option<&VariableSet> {
        self.globals.get(&self.domain)
    }

    /// 当前域的持久变量
    pub fn persistent_variables(&self) -> Option<&VariableSet> {
        self.persistents.get(&self.domain)
    }

    fn capacity(&self, scope: Scope) -> usize {
        match scope {
            Scope::Temp => self.config.local_capacity,
            Scope::Global => self.config.global_capacity,
            Scope::Persistent => self.config.persistent_capacity,
        }
    }

    fn check_index(&self, scope: Scope, index: usize) -> Result<(), VariableError> {
        let capacity = self.capacity(scope);
        if index >= capacity {
            return Err(VariableError::OutOfRange {
                scope,
                index,
                capacity,
            });
        }
        Ok(())
    }

    fn set_for_write(
        &mut self,
        scope: Scope,
        domain: &str,
    ) -> Result<&mut VariableSet, VariableError> {
        match scope {
            Scope::Persistent | Scope::Global => {
                self.ensure_domain(domain);
                let sets = if scope == Scope::Persistent {
                    &mut self.persistents
                } else {
                    &mut self.globals
                };
                Ok(sets.entry(domain.to_string()).or_default())
            }
            Scope::Temp => {
                let id = self
                    .active_context
                    .as_deref()
                    .ok_or(VariableError::NoActiveContext)?;
                self.locals
                    .get_mut(id)
                    .ok_or(VariableError::NoActiveContext)
            }
        }
    }

    fn set_for_read(
        &self,
        scope: Scope,
        domain: &str,
    ) -> Result<Option<&VariableSet>, VariableError> {
        match scope {
            Scope::Persistent => Ok(self.persistents.get(domain)),
            Scope::Global => Ok(self.globals.get(domain)),
            Scope::Temp => self
                .temp_variables()
                .map(Some)
                .ok_or(VariableError::NoActiveContext),
        }
    }

    // ========== 通用存取 ==========

    /// 按变量引用写入
    pub fn set_value_to<T: VariableType>(
        &mut self,
        var: &VariableRef,
        value: T,
    ) -> Result<(), VariableError> {
        let domain = self.resolve_domain(&var.domain);
        self.set_value_at_index(var.scope, var.index, value, &domain)
    }

    /// 按作用域、索引、域写入
    ///
    /// 临时作用域忽略 `domain`，写入当前上下文。
    pub fn set_value_at_index<T: VariableType>(
        &mut self,
        scope: Scope,
        index: usize,
        value: T,
        domain: &str,
    ) -> Result<(), VariableError> {
        self.check_index(scope, index)?;
        self.set_for_write(scope, domain)?.set(index, value);
        Ok(())
    }

    /// 读取操作数：字面量原样返回，变量引用按作用域解析
    pub fn value_of<T: VariableType>(&self, operand: &Operand<T>) -> Result<T, VariableError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Variable(var) => {
                let domain = self.resolve_domain(&var.domain);
                self.value_at_index(var.scope, var.index, &domain)
            }
        }
    }

    /// 读取可能缺失的操作数（缺失时为默认值）
    pub fn value_of_opt<T: VariableType>(
        &self,
        operand: Option<&Operand<T>>,
    ) -> Result<T, VariableError> {
        operand.map_or_else(|| Ok(T::default()), |operand| self.value_of(operand))
    }

    /// 读取指令参数中的原始 JSON
    ///
    /// 带 `index` 字段的对象视为变量引用，`null` 为默认值，
    /// 其他值按目标种类转换。
    pub fn value_of_json<T: VariableType>(&self, value: &Value) -> Result<T, VariableError> {
        if let Value::Object(map) = value
            && map.contains_key("index")
        {
            return match serde_json::from_value::<VariableRef>(value.clone()) {
                Ok(var) => self.value_of(&Operand::Variable(var)),
                Err(e) => {
                    trace!(error = %e, "无效的变量引用，使用默认值");
                    Ok(T::default())
                }
            };
        }
        Ok(T::coerce(value))
    }

    /// 按作用域、索引、域读取
    pub fn value_at_index<T: VariableType>(
        &self,
        scope: Scope,
        index: usize,
        domain: &str,
    ) -> Result<T, VariableError> {
        self.check_index(scope, index)?;
        Ok(self
            .set_for_read(scope, domain)?
            .map(|set| set.get(index))
            .unwrap_or_default())
    }

    kind_accessors!(
        f64,
        set_number_value_to,
        set_number_value_at_index,
        number_value_of,
        number_value_of_json,
        number_value_at_index
    );

    kind_accessors!(
        String,
        set_string_value_to,
        set_string_value_at_index,
        string_value_of,
        string_value_of_json,
        string_value_at_index
    );

    kind_accessors!(
        bool,
        set_boolean_value_to,
        set_boolean_value_at_index,
        boolean_value_of,
        boolean_value_of_json,
        boolean_value_at_index
    );

    kind_accessors!(
        ListValue,
        set_list_value_to,
        set_list_value_at_index,
        list_value_of,
        list_value_of_json,
        list_value_at_index
    );

    // ========== 清除 ==========

    /// 清除局部变量
    ///
    /// `context_id` 为 `None` 时清除所有上下文。`range` 两端都包含。
    pub fn clear_local_variables(
        &mut self,
        context_id: Option<&str>,
        clear_type: ClearType,
        range: Option<ClearRange>,
    ) {
        let range = range.map(ClearRange::to_exclusive);
        match context_id {
            Some(id) => {
                if let Some(set) = self.locals.get_mut(id) {
                    set.clear(clear_type, range);
                }
            }
            None => {
                for set in self.locals.values_mut() {
                    set.clear(clear_type, range.clone());
                }
            }
        }
        debug!(context = ?context_id, ?clear_type, "清除局部变量");
    }

    /// 清除当前域的全局变量。`range` 两端都包含。
    pub fn clear_global_variables(&mut self, clear_type: ClearType, range: Option<ClearRange>) {
        if let Some(set) = self.globals.get_mut(&self.domain) {
            set.clear(clear_type, range.map(ClearRange::to_exclusive));
        }
        debug!(domain = %self.domain, ?clear_type, "清除全局变量");
    }

    /// 清除当前域的持久变量。`range` 两端都包含。
    pub fn clear_persistent_variables(
        &mut self,
        clear_type: ClearType,
        range: Option<ClearRange>,
    ) {
        if let Some(set) = self.persistents.get_mut(&self.domain) {
            set.clear(clear_type, range.map(ClearRange::to_exclusive));
        }
        debug!(domain = %self.domain, ?clear_type, "清除持久变量");
    }

    /// 重置所有域的全局变量（新游戏）
    pub fn clear_all_global_variables(&mut self) {
        self.globals = self
            .domains
            .iter()
            .map(|domain| (domain.clone(), VariableSet::new()))
            .collect();
        debug!("重置全部全局变量");
    }

    /// 丢弃所有上下文的局部变量；活动上下文重新分配为空
    pub fn clear_all_local_variables(&mut self) {
        self.locals.clear();
        if let Some(id) = self.active_context.clone() {
            self.locals.insert(id, VariableSet::new());
        }
        debug!("重置全部局部变量");
    }

    // ========== 存档 ==========

    /// 导出存档数据（不含持久变量）
    pub fn save_bundle(&self) -> VariableBundle {
        VariableBundle {
            domains: self.domains.clone(),
            domain: self.domain.clone(),
            globals: self.globals.clone().into_iter().collect(),
            locals: self.locals.clone().into_iter().collect(),
            active_context: self.active_context.clone(),
        }
    }

    /// 从存档数据恢复（持久变量不受影响）
    pub fn restore_save_bundle(&mut self, bundle: VariableBundle) {
        self.domains.clear();
        self.globals.clear();
        for domain in &bundle.domains {
            self.ensure_domain(domain);
        }
        for (domain, set) in bundle.globals {
            self.ensure_domain(&domain);
            self.globals.insert(domain, set);
        }
        self.domain = bundle.domain;
        self.ensure_domain(&self.domain.clone());

        self.locals = bundle.locals.into_iter().collect();
        self.active_context = bundle.active_context;
        if let Some(id) = self.active_context.clone() {
            self.setup_local_variables(&id);
        }
        debug!(domains = ?self.domains, "恢复存档变量");
    }

    /// 导出持久变量
    pub fn persistent_bundle(&self) -> PersistentBundle {
        PersistentBundle {
            persistents: self.persistents.clone().into_iter().collect(),
        }
    }

    /// 恢复持久变量（按域覆盖）
    pub fn restore_persistent(&mut self, bundle: PersistentBundle) {
        for (domain, set) in bundle.persistents {
            self.ensure_domain(&domain);
            self.persistents.insert(domain, set);
        }
        debug!("恢复持久变量");
    }
}
