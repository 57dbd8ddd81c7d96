//! Program-facing file functions. All of them go through the run's
//! [`FileSystem`](crate::sandbox::FileSystem).

use super::args::{self, arity};
use crate::evaluator::{ErrorKind, Fault, Interpreter};
use crate::sandbox::{FileError, FileMode, SecurityRejection};
use crate::values::{Builtin, FileHandle, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub(super) const BUILTINS: &[Builtin] = &[
    Builtin::new("open", open),
    Builtin::new("read", read),
    Builtin::new("write", write),
    Builtin::new("close", close),
];

pub(super) const METHODS: &[Builtin] = &[
    Builtin::new("read", read),
    Builtin::new("readlines", readlines),
    Builtin::new("write", write),
    Builtin::new("close", close),
];

fn file_fault(interp: &Interpreter, err: FileError) -> Fault {
    match err {
        FileError::Disabled => interp.fault(SecurityRejection::FileAccessDisabled),
        FileError::InvalidMode { .. } => interp.error(ErrorKind::Value, err.to_string()),
        other => interp.error(ErrorKind::File, other.to_string()),
    }
}

/// Whole contents of `path`, size-checked.
pub(super) fn read_path(interp: &mut Interpreter, path: &str) -> Result<String, Fault> {
    let result = interp.files_mut()?.read(path);
    let text = result.map_err(|err| file_fault(interp, err))?;
    interp.check_collection_len(text.len())?;
    Ok(text)
}

/// Write `text` to `path`, refusing to grow the file past the size limit.
pub(super) fn write_path(interp: &mut Interpreter, path: &str, text: &str, append: bool) -> Result<(), Fault> {
    let files = interp.files_mut()?;
    let existing = if append { files.len(path) } else { Ok(0) };
    let existing = existing.map_err(|err| file_fault(interp, err))?;
    interp.check_collection_len(existing.saturating_add(text.len()))?;

    let result = interp.files_mut()?.write(path, text, append);
    result.map_err(|err| file_fault(interp, err))
}

/// `open(path)` or `open(path, mode)` with mode `r`, `w` or `a`.
///
/// Read handles load the whole file at open. `w` truncates right away, so a
/// file opened for writing and closed without writes ends up empty.
fn open(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "open", &args, 1, 2)?;
    let path = args::text(interp, "open", &args[0])?;
    let mode = match args.get(1) {
        None => FileMode::Read,
        Some(mode) => {
            let mode = args::text(interp, "open", mode)?;
            FileMode::parse(&mode).map_err(|err| file_fault(interp, err))?
        }
    };

    let content = match mode {
        FileMode::Read => read_path(interp, &path)?,
        FileMode::Write => {
            write_path(interp, &path, "", false)?;
            String::new()
        }
        FileMode::Append => {
            write_path(interp, &path, "", true)?;
            String::new()
        }
    };
    tracing::debug!(path = %path, ?mode, "opened file");

    Ok(Value::File(Rc::new(RefCell::new(FileHandle {
        path: path.to_string(),
        mode,
        content,
        closed: false,
    }))))
}

fn handle<'a>(interp: &Interpreter, name: &str, value: &'a Value) -> Result<&'a Rc<RefCell<FileHandle>>, Fault> {
    match value {
        Value::File(handle) => {
            if handle.borrow().closed {
                let path = handle.borrow().path.clone();
                return Err(interp.error(ErrorKind::File, format!("the file \"{}\" is closed", path)));
            }
            Ok(handle)
        }
        other => Err(args::mismatch(interp, name, "an open file", other)),
    }
}

fn readable<'a>(interp: &Interpreter, name: &str, value: &'a Value) -> Result<&'a Rc<RefCell<FileHandle>>, Fault> {
    let handle = handle(interp, name, value)?;
    if handle.borrow().mode != FileMode::Read {
        let path = handle.borrow().path.clone();
        return Err(interp.error(
            ErrorKind::File,
            format!("the file \"{}\" was not opened for reading", path),
        ));
    }
    Ok(handle)
}

fn read(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "read", &args, 1, 1)?;
    let handle = readable(interp, "read", &args[0])?;
    let content = handle.borrow().content.clone();
    Ok(Value::str(content))
}

/// Lines without their line endings.
fn readlines(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "readlines", &args, 1, 1)?;
    let handle = readable(interp, "readlines", &args[0])?;
    let lines = handle.borrow().content.lines().map(Value::from).collect();
    Ok(Value::list(lines))
}

/// Write through to the backend immediately. Text is written as is; other
/// values as `print` shows them.
fn write(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "write", &args, 2, 2)?;
    let handle = handle(interp, "write", &args[0])?.clone();
    let path = {
        let handle = handle.borrow();
        if handle.mode == FileMode::Read {
            return Err(interp.error(
                ErrorKind::File,
                format!("the file \"{}\" was opened for reading only", handle.path),
            ));
        }
        handle.path.clone()
    };
    let text = args[1].to_display_string();
    write_path(interp, &path, &text, true)?;
    Ok(Value::None)
}

fn close(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value, Fault> {
    arity(interp, "close", &args, 1, 1)?;
    match &args[0] {
        Value::File(handle) => {
            let mut handle = handle.borrow_mut();
            handle.closed = true;
            handle.content.clear();
            Ok(Value::None)
        }
        other => Err(args::mismatch(interp, "close", "a file", other)),
    }
}
