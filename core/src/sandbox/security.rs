//! The security policy shared by the validator and the evaluator.
//!
//! Both stages call the same checks: analyze reports a rejection as a
//! diagnostic, and execution re-checks each import, attribute and name as
//! it is reached.

use super::Capabilities;
use thiserror::Error;

/// Names whose attributes are never reachable.
pub const RESTRICTED_OBJECTS: &[&str] = &[
    "os",
    "sys",
    "subprocess",
    "socket",
    "shutil",
    "builtins",
    "importlib",
];

/// Names that would allow dynamic evaluation or introspection.
pub const FORBIDDEN_NAMES: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "__import__",
    "globals",
    "locals",
    "vars",
    "getattr",
    "setattr",
    "delattr",
    "breakpoint",
    "input",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityRejection {
    #[error("Import not allowed: {module}")]
    ModuleNotAllowed { module: String },

    #[error("Access to private attribute `{attribute}` is not allowed")]
    PrivateAttribute { attribute: String },

    #[error("Access to `{object}.{attribute}` is not allowed")]
    RestrictedObject { object: String, attribute: String },

    #[error("`{name}` is not available in TALE programs")]
    ForbiddenName { name: String },

    #[error("File access is disabled")]
    FileAccessDisabled,
}

impl SecurityRejection {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            SecurityRejection::ModuleNotAllowed { .. } => "X001",
            SecurityRejection::PrivateAttribute { .. } => "X002",
            SecurityRejection::RestrictedObject { .. } => "X003",
            SecurityRejection::ForbiddenName { .. } => "X004",
            SecurityRejection::FileAccessDisabled => "X005",
        }
    }
}

/// Check an `import` of a possibly dotted module path.
pub fn check_import(module: &str, capabilities: &Capabilities) -> Result<(), SecurityRejection> {
    let allowed = !module.contains('.') && capabilities.module(module).is_some();
    if allowed {
        Ok(())
    } else {
        tracing::warn!(module, "rejected import");
        Err(SecurityRejection::ModuleNotAllowed {
            module: module.to_string(),
        })
    }
}

/// Check a bare name reference.
pub fn check_name(name: &str) -> Result<(), SecurityRejection> {
    if FORBIDDEN_NAMES.contains(&name) || name.starts_with("__") {
        tracing::warn!(name, "rejected name");
        return Err(SecurityRejection::ForbiddenName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Check `object.attribute`; `object` is the receiver's name when it is a
/// plain identifier.
pub fn check_attribute(object: Option<&str>, attribute: &str) -> Result<(), SecurityRejection> {
    if attribute.starts_with('_') {
        tracing::warn!(attribute, "rejected private attribute");
        return Err(SecurityRejection::PrivateAttribute {
            attribute: attribute.to_string(),
        });
    }
    if let Some(object) = object.filter(|object| RESTRICTED_OBJECTS.contains(object)) {
        tracing::warn!(object, attribute, "rejected restricted object");
        return Err(SecurityRejection::RestrictedObject {
            object: object.to_string(),
            attribute: attribute.to_string(),
        });
    }
    Ok(())
}
