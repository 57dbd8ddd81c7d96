//! The file shim. Every file operation a program performs goes through
//! [`FileSystem`], which checks paths and modes before touching a backend.

use hashbrown::HashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Where program file operations go.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileAccess {
    /// Every file operation is rejected.
    Disabled,
    /// A fresh in-memory file system per run, optionally pre-seeded.
    Memory {
        #[serde(default)]
        files: BTreeMap<String, String>,
    },
    /// Real files, confined under `root`.
    Directory { root: PathBuf },
}

impl Default for FileAccess {
    fn default() -> Self {
        FileAccess::Memory {
            files: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

impl FileMode {
    pub fn parse(mode: &str) -> Result<Self, FileError> {
        match mode {
            "r" => Ok(FileMode::Read),
            "w" => Ok(FileMode::Write),
            "a" => Ok(FileMode::Append),
            other => Err(FileError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("File access is disabled")]
    Disabled,
    #[error("The path \"{path}\" is not allowed: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("The file mode \"{mode}\" is not supported; use \"r\", \"w\" or \"a\"")]
    InvalidMode { mode: String },
    #[error("No such file: \"{path}\"")]
    NotFound { path: String },
    #[error("Could not access \"{path}\": {message}")]
    Io { path: String, message: String },
}

/// Per-run file backend.
#[derive(Debug)]
pub enum FileSystem {
    Disabled,
    Memory(HashMap<String, String>),
    Directory(PathBuf),
}

impl FileSystem {
    pub fn new(access: &FileAccess) -> Self {
        match access {
            FileAccess::Disabled => FileSystem::Disabled,
            FileAccess::Memory { files } => FileSystem::Memory(
                files
                    .iter()
                    .map(|(path, content)| (path.clone(), content.clone()))
                    .collect(),
            ),
            FileAccess::Directory { root } => FileSystem::Directory(root.clone()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, FileSystem::Disabled)
    }

    pub fn read(&self, path: &str) -> Result<String, FileError> {
        check_path(path)?;
        match self {
            FileSystem::Disabled => Err(FileError::Disabled),
            FileSystem::Memory(files) => files.get(path).cloned().ok_or_else(|| FileError::NotFound {
                path: path.to_string(),
            }),
            FileSystem::Directory(root) => std::fs::read_to_string(root.join(path)).map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => FileError::NotFound {
                    path: path.to_string(),
                },
                _ => io_error(path, err),
            }),
        }
    }

    /// Size of the file at `path` in bytes; zero when it does not exist yet.
    pub fn len(&self, path: &str) -> Result<usize, FileError> {
        check_path(path)?;
        match self {
            FileSystem::Disabled => Err(FileError::Disabled),
            FileSystem::Memory(files) => Ok(files.get(path).map_or(0, String::len)),
            FileSystem::Directory(root) => match std::fs::metadata(root.join(path)) {
                Ok(metadata) => Ok(usize::try_from(metadata.len()).unwrap_or(usize::MAX)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
                Err(err) => Err(io_error(path, err)),
            },
        }
    }

    /// Replace (`append == false`) or extend the file at `path`.
    pub fn write(&mut self, path: &str, text: &str, append: bool) -> Result<(), FileError> {
        check_path(path)?;
        match self {
            FileSystem::Disabled => Err(FileError::Disabled),
            FileSystem::Memory(files) => {
                let file = files.entry(path.to_string()).or_default();
                if !append {
                    file.clear();
                }
                file.push_str(text);
                Ok(())
            }
            FileSystem::Directory(root) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(append)
                    .truncate(!append)
                    .open(root.join(path))
                    .map_err(|err| io_error(path, err))?;
                file.write_all(text.as_bytes()).map_err(|err| io_error(path, err))
            }
        }
    }

    /// Contents of the in-memory backend, for hosts that want to show
    /// what a program wrote.
    pub fn memory_files(&self) -> Option<&HashMap<String, String>> {
        match self {
            FileSystem::Memory(files) => Some(files),
            _ => None,
        }
    }
}

fn io_error(path: &str, err: std::io::Error) -> FileError {
    FileError::Io {
        path: path.to_string(),
        message: err.to_string(),
    }
}

/// Paths must be relative, non-empty and stay below the root.
pub fn check_path(path: &str) -> Result<(), FileError> {
    let invalid = |reason| {
        tracing::warn!(path, reason, "rejected file path");
        Err(FileError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };

    if path.trim().is_empty() {
        return invalid("the path is empty");
    }
    if path.contains('\0') || path.contains('\\') {
        return invalid("the path contains a forbidden character");
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return invalid("`..` is not allowed"),
            Component::RootDir | Component::Prefix(_) => return invalid("the path must be relative"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_path_rules() {
        assert!(check_path("notes.txt").is_ok());
        assert!(check_path("data/scores.csv").is_ok());
        assert!(check_path("").is_err());
        assert!(check_path("../secret").is_err());
        assert!(check_path("a/../../b").is_err());
        assert!(check_path("/etc/passwd").is_err());
        assert!(check_path("a\\b").is_err());
    }

    #[test]
    fn test_memory_backend() {
        let mut files = FileSystem::new(&FileAccess::default());
        files.write("log.txt", "a\n", false).unwrap();
        files.write("log.txt", "b\n", true).unwrap();
        assert_eq!(files.read("log.txt").unwrap(), "a\nb\n");
        assert_eq!(files.len("log.txt"), Ok(4));
        assert_eq!(files.len("new.txt"), Ok(0));
        files.write("log.txt", "c", false).unwrap();
        assert_eq!(files.read("log.txt").unwrap(), "c");
        assert_eq!(
            files.read("missing.txt"),
            Err(FileError::NotFound {
                path: "missing.txt".to_string()
            })
        );
    }

    #[test]
    fn test_disabled_backend() {
        let mut files = FileSystem::new(&FileAccess::Disabled);
        assert_eq!(files.read("a.txt"), Err(FileError::Disabled));
        assert_eq!(files.write("a.txt", "x", false), Err(FileError::Disabled));
    }

    #[test]
    fn test_modes() {
        assert_eq!(FileMode::parse("a"), Ok(FileMode::Append));
        assert!(FileMode::parse("rb").is_err());
        assert!(FileMode::parse("r+").is_err());
    }

    #[test]
    fn test_access_from_json() {
        let access: FileAccess =
            serde_json::from_str(r#"{"kind": "memory", "files": {"in.txt": "hi"}}"#).unwrap();
        let files = FileSystem::new(&access);
        assert_eq!(files.read("in.txt").unwrap(), "hi");
    }
}
