use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::watch;
use tracing::info_span;
use walkdir::WalkDir;

use crate::error::{RuleError, SchedulerError};
use crate::matcher::RuleMatcher;
use crate::metadata::MetadataProvider;
use crate::pipeline::describe_actions;
use crate::rule::{validate_rule, MatchType, Rule};
use crate::script::ScriptRunner;
use crate::settings::EngineSettings;

/// Dry-run verdict for one file against a rule draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub file_path: PathBuf,
    pub matched: bool,
    /// Per top-level condition, in declaration order.
    pub condition_results: Vec<bool>,
    /// Token-resolved action descriptions; only rendered for matches.
    pub action_descriptions: Vec<String>,
}

/// Evaluates rule drafts against sample files without touching the
/// filesystem. The service holds no `FileOps` at all, so a preview cannot
/// move, rename, or delete anything.
pub struct PreviewService {
    settings: Arc<EngineSettings>,
    metadata: Arc<dyn MetadataProvider>,
    script_runner: Arc<dyn ScriptRunner>,
}

impl PreviewService {
    pub fn new(
        settings: Arc<EngineSettings>,
        metadata: Arc<dyn MetadataProvider>,
        script_runner: Arc<dyn ScriptRunner>,
    ) -> Self {
        Self {
            settings,
            metadata,
            script_runner,
        }
    }

    /// Previews `rule` against `files`, capped at `previewMaxFiles`.
    ///
    /// The draft is validated first so a broken regex or empty destination
    /// surfaces as an error instead of a silently empty preview. Output is
    /// deterministic: unchanged inputs re-render to identical previews.
    pub fn preview(
        &self,
        rule: &Rule,
        files: &[PathBuf],
    ) -> std::result::Result<Vec<FilePreview>, RuleError> {
        let _span = info_span!("preview", rule = %rule.name).entered();
        validate_rule(rule)?;

        let matcher = RuleMatcher::for_rule(rule, Arc::clone(&self.script_runner));
        let limit = self.settings.preview_max_files;

        let mut previews = Vec::with_capacity(files.len().min(limit));
        for (index, path) in files.iter().take(limit).enumerate() {
            let meta = match self.metadata.metadata(path) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("Skipping unreadable preview file {}: {}", path.display(), e);
                    continue;
                }
            };

            // Fold the per-condition results rather than re-evaluating the
            // group: each condition (shell scripts included) runs exactly
            // once per file, and the verdict always agrees with the
            // explain output.
            let condition_results = matcher.explain_group(&rule.conditions, &meta);
            let matched = match rule.conditions.match_type {
                MatchType::All => condition_results.iter().all(|&hit| hit),
                MatchType::Any => condition_results.iter().any(|&hit| hit),
                MatchType::None => !condition_results.iter().any(|&hit| hit),
            };
            let action_descriptions = if matched {
                describe_actions(&rule.actions, &meta, index as u64, &self.settings)
            } else {
                Vec::new()
            };

            previews.push(FilePreview {
                file_path: path.clone(),
                matched,
                condition_results,
                action_descriptions,
            });
        }

        Ok(previews)
    }

    /// Samples up to `previewMaxFiles` direct children of `folder`, skipping
    /// ignored names. Sorted by path so repeated samples line up.
    pub fn collect_sample(
        &self,
        folder: &Path,
    ) -> std::result::Result<Vec<PathBuf>, SchedulerError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| SchedulerError::ScanFailed {
                path: folder.to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.settings.is_ignored(entry.path()) {
                continue;
            }
            files.push(entry.path().to_path_buf());
            if files.len() >= self.settings.preview_max_files {
                break;
            }
        }
        Ok(files)
    }
}

/// A completed preview computation, stamped with the request generation
/// that produced it.
#[derive(Debug, Clone)]
pub struct PreviewUpdate {
    pub generation: u64,
    pub outcome: std::result::Result<Vec<FilePreview>, String>,
}

/// Debounces preview requests from a live rule editor.
///
/// Every request bumps a generation counter. The computation waits out the
/// debounce window, then checks the counter before starting and again
/// before publishing, so a stale request can never overwrite the result of
/// a newer one.
pub struct PreviewDebouncer {
    service: Arc<PreviewService>,
    generation: Arc<AtomicU64>,
    sender: watch::Sender<Option<PreviewUpdate>>,
    receiver: watch::Receiver<Option<PreviewUpdate>>,
    debounce: Duration,
}

impl PreviewDebouncer {
    /// Debounce window taken from `previewDebounceMs`.
    pub fn from_settings(service: Arc<PreviewService>) -> Self {
        let debounce = Duration::from_millis(service.settings.preview_debounce_ms);
        Self::new(service, debounce)
    }

    pub fn new(service: Arc<PreviewService>, debounce: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);
        Self {
            service,
            generation: Arc::new(AtomicU64::new(0)),
            sender,
            receiver,
            debounce,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PreviewUpdate>> {
        self.receiver.clone()
    }

    /// Schedules a preview of `rule` against `files`. Returns the request's
    /// generation; only the newest generation ever publishes.
    pub fn request(&self, rule: Rule, files: Vec<PathBuf>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.generation);
        let service = Arc::clone(&self.service);
        let sender = self.sender.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != generation {
                debug!("Preview generation {} superseded before start", generation);
                return;
            }

            let outcome = tokio::task::spawn_blocking(move || {
                service
                    .preview(&rule, &files)
                    .map_err(|e| e.to_string())
            })
            .await
            .unwrap_or_else(|e| Err(format!("preview task failed: {}", e)));

            if latest.load(Ordering::SeqCst) != generation {
                debug!("Preview generation {} superseded after compute", generation);
                return;
            }

            sender.send_replace(Some(PreviewUpdate {
                generation,
                outcome,
            }));
        });

        generation
    }
}
