use crate::utils::files;
use std::path::{Path, PathBuf};

/// Handle to a source or derived file.
///
/// A handle is backed by a filesystem path, an in-memory binary, or both; at
/// least one must be present and `file_name` is always non-empty (extensions
/// are derived from it). `is_temp` marks paths the pipeline itself created;
/// cleanup of those is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub path: Option<PathBuf>,
    pub binary: Option<Vec<u8>>,
    pub file_name: String,
    pub is_temp: bool,
}

impl FileHandle {
    /// Handle backed by an existing file on disk; the file name is taken from
    /// the path's final component.
    pub fn from_path<T: Into<PathBuf>>(path: T) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        FileHandle {
            path: Some(path),
            binary: None,
            file_name,
            is_temp: false,
        }
    }

    /// Handle backed by in-memory bytes; materialized to disk on demand.
    pub fn from_binary<T: Into<String>>(binary: Vec<u8>, file_name: T) -> Self {
        FileHandle {
            path: None,
            binary: Some(binary),
            file_name: file_name.into(),
            is_temp: false,
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Extension derived from `file_name`, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        files::extension_of(&self.file_name)
    }

    pub fn stem(&self) -> &str {
        files::stem_of(&self.file_name)
    }
}
