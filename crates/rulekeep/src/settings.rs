use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Read-only inputs supplied by the surrounding application. The engine
/// never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Upper bound on concurrently evaluated file events.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_rules: usize,

    /// Cap on the number of sample files a single preview evaluates.
    #[serde(default = "default_preview_max_files")]
    pub preview_max_files: usize,

    /// Quiescence window before a pending preview fires.
    #[serde(default = "default_debounce_ms")]
    pub preview_debounce_ms: u64,

    /// Gate for the `deletePermanently` action. When false the action is a
    /// rejected step, never a silent downgrade to trash.
    #[serde(default)]
    pub allow_permanent_delete: bool,

    /// Gate for the `makePdfSearchable` action.
    #[serde(default)]
    pub ocr_enabled: bool,

    /// Glob patterns matched against file names; matching files are never
    /// handed to the scheduler or included in preview samples.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_max_concurrent() -> usize {
    num_cpus::get()
}

fn default_preview_max_files() -> usize {
    100
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_rules: default_max_concurrent(),
            preview_max_files: default_preview_max_files(),
            preview_debounce_ms: default_debounce_ms(),
            allow_permanent_delete: false,
            ocr_enabled: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl EngineSettings {
    /// Returns true if the file name matches any configured ignore pattern.
    /// Invalid patterns are skipped rather than treated as matches.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        self.ignore_patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches(name))
    }
}
