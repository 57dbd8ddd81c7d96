use super::Value;
use super::function::Function;
use crate::sandbox::FileMode;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A method looked up through a value, remembering its receiver.
pub struct BoundMethod {
    pub name: String,
    pub receiver: Value,
    /// Either a user [`Function`] or a native builtin.
    pub method: Value,
}

pub struct Class {
    pub name: String,
    pub methods: HashMap<String, Rc<Function>>,
}

pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        super::value::release(self.fields.get_mut().drain().map(|(_, value)| value).collect());
    }
}

/// An allow-listed module, materialized for one run.
pub struct Module {
    pub name: String,
    pub members: HashMap<String, Value>,
}

/// An open handle from the file shim.
#[derive(Debug)]
pub struct FileHandle {
    pub path: String,
    pub mode: FileMode,
    /// Whole contents for read handles, loaded at open.
    pub content: String,
    pub closed: bool,
}

/// The value a `catch` block receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub kind: String,
    pub message: String,
}

impl ErrorValue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
