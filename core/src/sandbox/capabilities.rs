//! The capability table: every builtin and module a run can reach.
//!
//! The table is an immutable value built once and shared through an `Arc`.
//! The evaluator resolves names against it and nothing else, so a symbol
//! that is not listed here does not exist for a program.

use crate::stdlib;
use crate::values::{Builtin, Module, NativeFn, Value};
use hashbrown::HashMap;
use std::fmt;

#[derive(Clone, Copy)]
pub enum MemberKind {
    Function(NativeFn),
    Int(i64),
    Float(f64),
}

impl fmt::Debug for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Function(_) => f.write_str("Function"),
            MemberKind::Int(n) => write!(f, "Int({})", n),
            MemberKind::Float(x) => write!(f, "Float({})", x),
        }
    }
}

/// One exported member of a module.
#[derive(Debug, Clone, Copy)]
pub struct Member {
    pub name: &'static str,
    pub kind: MemberKind,
}

impl Member {
    pub const fn function(name: &'static str, func: NativeFn) -> Self {
        Self {
            name,
            kind: MemberKind::Function(func),
        }
    }

    pub const fn float(name: &'static str, value: f64) -> Self {
        Self {
            name,
            kind: MemberKind::Float(value),
        }
    }

    pub const fn int(name: &'static str, value: i64) -> Self {
        Self {
            name,
            kind: MemberKind::Int(value),
        }
    }

    fn to_value(self) -> Value {
        match self.kind {
            MemberKind::Function(func) => Value::Builtin(Builtin::new(self.name, func)),
            MemberKind::Int(n) => Value::Int(n),
            MemberKind::Float(x) => Value::Float(x),
        }
    }
}

/// An allow-listed module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec {
    pub name: &'static str,
    pub members: &'static [Member],
}

impl ModuleSpec {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name == name)
    }

    /// Materialize the module as a runtime value.
    pub fn instantiate(&self) -> Module {
        Module {
            name: self.name.to_string(),
            members: self
                .members
                .iter()
                .map(|member| (member.name.to_string(), member.to_value()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Capabilities {
    builtins: HashMap<&'static str, Builtin>,
    modules: Vec<ModuleSpec>,
}

impl Capabilities {
    /// An empty table: no builtins, no modules.
    pub fn empty() -> Self {
        Self {
            builtins: HashMap::new(),
            modules: Vec::new(),
        }
    }

    /// The standard TALE table.
    pub fn standard() -> Self {
        let mut capabilities = Self::empty();
        for builtin in stdlib::builtins() {
            capabilities = capabilities.with_builtin(builtin);
        }
        for module in stdlib::modules() {
            capabilities = capabilities.with_module(module);
        }
        capabilities
    }

    pub fn with_builtin(mut self, builtin: Builtin) -> Self {
        self.builtins.insert(builtin.name, builtin);
        self
    }

    pub fn with_module(mut self, module: ModuleSpec) -> Self {
        self.modules.retain(|existing| existing.name != module.name);
        self.modules.push(module);
        self
    }

    pub fn without_module(mut self, name: &str) -> Self {
        self.modules.retain(|module| module.name != name);
        self
    }

    pub fn builtin(&self, name: &str) -> Option<Builtin> {
        self.builtins.get(name).copied()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleSpec> {
        self.modules.iter().find(|module| module.name == name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleSpec> {
        self.modules.iter()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let capabilities = Capabilities::standard();
        for name in ["math", "random", "datetime", "json", "csv"] {
            assert!(capabilities.module(name).is_some(), "missing module {}", name);
        }
        assert!(capabilities.module("os").is_none());
        assert!(capabilities.builtin("print").is_some());
        assert!(capabilities.builtin("eval").is_none());
    }

    #[test]
    fn test_table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Capabilities>();
    }

    #[test]
    fn test_module_members() {
        let capabilities = Capabilities::standard();
        let math = capabilities.module("math").unwrap();
        assert!(math.member("sqrt").is_some());
        assert!(math.member("system").is_none());
        assert!(math.instantiate().members.contains_key("pi"));
    }
}
