//! File-system collaborator for static serving.
//!
//! Static routes read files through the [`FileSystem`] trait so that they can
//! be backed by a directory on disk ([`Dir`]) or by anything else that can
//! hand out readers by name.
//!
//! # Security
//!
//! [`Dir`] refuses, with [`DraftError::Forbidden`]:
//!
//! - parent-directory components (`..`)
//! - hidden files and directories (names starting with `.`)
//! - names containing a NUL byte
//! - paths that resolve outside the root once symlinks are followed
//!
//! Directories are reported as not found.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use crate::error::{DraftError, DraftResult};

/// A source of named, readable files.
pub trait FileSystem: Send + Sync {
    /// Opens the file called `name`, a `/`-separated path relative to the
    /// file system root.
    fn open(&self, name: &str) -> DraftResult<Box<dyn Read + Send>>;
}

/// A [`FileSystem`] rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct Dir {
    root: PathBuf,
}

impl Dir {
    /// Creates a file system serving files below `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> DraftResult<PathBuf> {
        let relative = name.trim_start_matches('/');
        if relative.contains('\0') {
            return Err(DraftError::Forbidden(name.to_string()));
        }

        for component in Path::new(relative).components() {
            match component {
                Component::ParentDir => return Err(DraftError::Forbidden(name.to_string())),
                Component::Normal(part) if part.to_string_lossy().starts_with('.') => {
                    return Err(DraftError::Forbidden(name.to_string()));
                }
                _ => {}
            }
        }

        let root = self.root.canonicalize()?;
        let full = root.join(relative).canonicalize()?;
        if !full.starts_with(&root) {
            return Err(DraftError::Forbidden(name.to_string()));
        }
        if full.is_dir() {
            let err = io::Error::new(io::ErrorKind::NotFound, "directories are not served");
            return Err(err.into());
        }
        Ok(full)
    }
}

impl FileSystem for Dir {
    fn open(&self, name: &str) -> DraftResult<Box<dyn Read + Send>> {
        let path = self.resolve(name)?;
        Ok(Box::new(File::open(path)?))
    }
}

/// Maps a file name to a MIME type using its extension.
#[must_use]
pub fn content_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",

        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",

        "wasm" => "application/wasm",

        _ => "application/octet-stream",
    }
}
