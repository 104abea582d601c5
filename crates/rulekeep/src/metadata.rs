use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::FileOpsError;

/// Coarse classification used by `kind` conditions. Derived from the MIME
/// type guessed from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Text,
    Application,
    Folder,
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path, is_dir: bool) -> Self {
        if is_dir {
            return Self::Folder;
        }

        let Some(mime) = mime_guess::from_path(path).first() else {
            return Self::Other;
        };

        match mime.type_().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "text" => Self::Text,
            "application" => match mime.subtype().as_str() {
                "pdf" | "msword" | "rtf" => Self::Document,
                s if s.contains("officedocument") || s.contains("opendocument") => Self::Document,
                "zip" | "gzip" | "x-tar" | "x-7z-compressed" | "x-bzip2" | "x-rar-compressed" => {
                    Self::Archive
                }
                "json" | "xml" | "javascript" => Self::Text,
                _ => Self::Application,
            },
            _ => Self::Other,
        }
    }
}

/// Snapshot of one file's attributes, taken once per evaluation. Timestamps
/// that cannot be read are `None`; conditions on them fail closed.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub path: PathBuf,
    /// File name without the final extension.
    pub name: String,
    /// Final extension, lowercased, without the dot. Empty if none.
    pub extension: String,
    /// File name including the extension.
    pub full_name: String,
    pub size: Option<u64>,
    pub created: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
    /// When the file appeared in the watched folder. The watcher supplies
    /// this; the filesystem fallback reuses the creation time.
    pub added: Option<DateTime<Local>>,
    pub kind: FileKind,
    pub is_dir: bool,
}

impl FileMetadata {
    /// Builds metadata purely from a path, with no filesystem access.
    /// Useful for previewing rules against hypothetical files.
    pub fn from_path_only(path: &Path) -> Self {
        let (name, extension, full_name) = split_name(path);
        Self {
            path: path.to_path_buf(),
            name,
            extension,
            full_name,
            size: None,
            created: None,
            modified: None,
            added: None,
            kind: FileKind::from_path(path, false),
            is_dir: false,
        }
    }
}

fn split_name(path: &Path) -> (String, String, String) {
    let full_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    (name, extension, full_name)
}

fn to_local(time: std::io::Result<SystemTime>) -> Option<DateTime<Local>> {
    time.ok().map(DateTime::<Local>::from)
}

/// Metadata access seam. The engine only ever reads through this trait so
/// tests and the preview path can supply synthetic attributes.
pub trait MetadataProvider: Send + Sync {
    fn metadata(&self, path: &Path) -> std::result::Result<FileMetadata, FileOpsError>;
}

/// Reads attributes from the local filesystem.
pub struct FsMetadataProvider;

impl MetadataProvider for FsMetadataProvider {
    fn metadata(&self, path: &Path) -> std::result::Result<FileMetadata, FileOpsError> {
        let meta = std::fs::metadata(path).map_err(|e| FileOpsError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })?;

        let (name, extension, full_name) = split_name(path);
        let created = to_local(meta.created());
        let modified = to_local(meta.modified());

        Ok(FileMetadata {
            path: path.to_path_buf(),
            name,
            extension,
            full_name,
            size: Some(meta.len()),
            created,
            modified,
            added: created,
            kind: FileKind::from_path(path, meta.is_dir()),
            is_dir: meta.is_dir(),
        })
    }
}
