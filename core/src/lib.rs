//! Core of the TALE engine: structure recovery, line transformation,
//! validation and sandboxed execution of TALE programs.
//!
//! Most hosts only need [`api::Engine`].

pub mod api;
pub mod blocks;
pub mod diagnostics;
pub mod evaluator;
pub mod parser;
pub mod sandbox;
pub mod source;
pub mod stdlib;
pub mod transform;
pub mod validator;
pub mod values;
