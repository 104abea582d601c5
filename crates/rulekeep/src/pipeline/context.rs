use std::path::{Path, PathBuf};

use crate::metadata::FileMetadata;
use crate::tokens::TokenContext;

/// Per-file state threaded through one pipeline run. Tracks the file's
/// *current* location so each action resolves its patterns against the
/// result of the actions before it.
pub struct ActionContext {
    pub meta: FileMetadata,
    /// Sequence number of this file within its batch; drives `{counter}`.
    pub sequence: u64,
}

impl ActionContext {
    pub fn new(meta: FileMetadata, sequence: u64) -> Self {
        Self { meta, sequence }
    }

    pub fn current_path(&self) -> &Path {
        &self.meta.path
    }

    /// Parent of the file's current location.
    pub fn current_dir(&self) -> PathBuf {
        self.meta
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    pub fn token_context(&self) -> TokenContext {
        TokenContext::from_metadata(&self.meta, self.sequence)
    }

    /// Records that the file now lives at `new_path`, refreshing the
    /// name-derived metadata fields.
    pub fn relocate(&mut self, new_path: PathBuf) {
        self.meta.full_name = new_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.meta.name = new_path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.meta.extension = new_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.meta.path = new_path;
    }
}
