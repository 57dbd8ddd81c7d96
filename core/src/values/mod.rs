pub mod function;
pub mod object;
pub mod table;
pub mod value;

pub use function::{Builtin, Function, FunctionBody, NativeFn};
pub use object::{BoundMethod, Class, ErrorValue, FileHandle, Instance, Module};
pub use table::{Key, Table};
pub use value::{DictCell, ListCell, MAX_COMPARE_DEPTH, NestingTooDeep, TupleCell, Value, format_float};

#[cfg(test)]
mod value_test;
