use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tracing::info_span;

use crate::error::{ActionError, FileOpsError};
use crate::fileops::FileOps;
use crate::rule::{Action, ArchiveFormat, ConflictResolution};
use crate::script::ScriptRunner;
use crate::settings::EngineSettings;
use crate::tokens;

use super::context::ActionContext;

/// Outcome of one file's pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every action ran (some may have been skipped by conflict policy).
    Completed,
    /// An `ignore` action terminated the list early.
    Ignored,
    /// The action at `index` failed; subsequent actions were not attempted.
    Failed { index: usize },
}

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub steps: Vec<StepResult>,
    pub outcome: PipelineOutcome,
    /// Set when a `continue` action ran; tells the scheduler to advance to
    /// the next rule regardless of `stopProcessing`.
    pub continue_requested: bool,
    /// Where the file ended up after any move or rename actions.
    pub final_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub label: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone)]
pub enum StepStatus {
    Done { detail: String },
    Skipped { reason: String },
    Failed { error: String },
}

/// Executes a matched file's ordered action list against the I/O
/// capability. Each action resolves its patterns immediately before acting,
/// so later actions see the file's current location and name.
pub struct ActionExecutor {
    fileops: Arc<dyn FileOps>,
    script_runner: Arc<dyn ScriptRunner>,
    settings: Arc<EngineSettings>,
}

impl ActionExecutor {
    pub fn new(
        fileops: Arc<dyn FileOps>,
        script_runner: Arc<dyn ScriptRunner>,
        settings: Arc<EngineSettings>,
    ) -> Self {
        Self {
            fileops,
            script_runner,
            settings,
        }
    }

    pub fn execute(&self, actions: &[Action], ctx: &mut ActionContext) -> PipelineRun {
        let _span = info_span!("action_pipeline", file = %ctx.current_path().display()).entered();

        let mut steps = Vec::with_capacity(actions.len());
        let mut continue_requested = false;

        for (index, action) in actions.iter().enumerate() {
            let label = action_label(action).to_string();
            debug!("Step {}: {}", index, label);

            match self.execute_action(action, ctx, &mut continue_requested) {
                Ok(StepOutcome::Done(detail)) => {
                    steps.push(StepResult {
                        label,
                        status: StepStatus::Done { detail },
                    });
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    steps.push(StepResult {
                        label,
                        status: StepStatus::Skipped { reason },
                    });
                }
                Ok(StepOutcome::Stop) => {
                    steps.push(StepResult {
                        label,
                        status: StepStatus::Done {
                            detail: "pipeline terminated".to_string(),
                        },
                    });
                    return PipelineRun {
                        steps,
                        outcome: PipelineOutcome::Ignored,
                        continue_requested,
                        final_path: ctx.current_path().to_path_buf(),
                    };
                }
                Err(e) => {
                    warn!(
                        "Action '{}' failed for {}: {}",
                        label,
                        ctx.current_path().display(),
                        e
                    );
                    steps.push(StepResult {
                        label,
                        status: StepStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                    return PipelineRun {
                        steps,
                        outcome: PipelineOutcome::Failed { index },
                        continue_requested,
                        final_path: ctx.current_path().to_path_buf(),
                    };
                }
            }
        }

        PipelineRun {
            steps,
            outcome: PipelineOutcome::Completed,
            continue_requested,
            final_path: ctx.current_path().to_path_buf(),
        }
    }

    fn execute_action(
        &self,
        action: &Action,
        ctx: &mut ActionContext,
        continue_requested: &mut bool,
    ) -> Result<StepOutcome, ActionError> {
        match action {
            Action::Move {
                destination,
                on_conflict,
                skip_duplicates,
            } => {
                let dir = self.resolve_dir(destination, ctx)?;
                self.transfer(ctx, &dir, *on_conflict, *skip_duplicates, Transfer::Move)
            }
            Action::SortIntoSubfolder {
                destination,
                on_conflict,
                skip_duplicates,
            } => {
                let sub = tokens::resolve(destination, &ctx.token_context());
                if sub.trim().is_empty() {
                    return Err(ActionError::EmptyDestination {
                        pattern: destination.clone(),
                    });
                }
                let dir = ctx.current_dir().join(sub);
                self.transfer(ctx, &dir, *on_conflict, *skip_duplicates, Transfer::Move)
            }
            Action::Copy {
                destination,
                on_conflict,
                skip_duplicates,
            } => {
                let dir = self.resolve_dir(destination, ctx)?;
                self.transfer(ctx, &dir, *on_conflict, *skip_duplicates, Transfer::Copy)
            }
            Action::Rename {
                pattern,
                on_conflict,
            } => self.rename(ctx, pattern, *on_conflict),
            Action::Archive {
                destination,
                format,
                delete_original,
            } => self.archive(ctx, destination, *format, *delete_original),
            Action::Unarchive {
                destination,
                delete_archive,
            } => self.unarchive(ctx, destination.as_deref(), *delete_archive),
            Action::Delete => {
                self.fileops.trash(ctx.current_path())?;
                Ok(StepOutcome::Done("moved to trash".to_string()))
            }
            Action::DeletePermanently => {
                if !self.settings.allow_permanent_delete {
                    // A rejection, never a silent downgrade to trash.
                    return Err(ActionError::PermanentDeleteDisabled);
                }
                self.fileops.delete_permanently(ctx.current_path())?;
                Ok(StepOutcome::Done("deleted permanently".to_string()))
            }
            Action::RunScript { command } => {
                let resolved = tokens::resolve(command, &ctx.token_context());
                let code = self.script_runner.run(&resolved, ctx.current_path())?;
                if code != 0 {
                    return Err(ActionError::ScriptFailed {
                        command: resolved,
                        code,
                    });
                }
                Ok(StepOutcome::Done("script succeeded".to_string()))
            }
            Action::Notify { message } => {
                let resolved = tokens::resolve(message, &ctx.token_context());
                self.fileops.notify(&resolved)?;
                Ok(StepOutcome::Done(resolved))
            }
            Action::Open => {
                self.fileops.open(ctx.current_path(), None)?;
                Ok(StepOutcome::Done("opened".to_string()))
            }
            Action::OpenWith { app } => {
                self.fileops.open(ctx.current_path(), Some(app))?;
                Ok(StepOutcome::Done(format!("opened with {}", app)))
            }
            Action::ShowInFileManager => {
                self.fileops.reveal(ctx.current_path())?;
                Ok(StepOutcome::Done("revealed".to_string()))
            }
            Action::MakePdfSearchable => {
                if !self.settings.ocr_enabled {
                    return Err(ActionError::OcrDisabled);
                }
                self.fileops.make_searchable(ctx.current_path())?;
                Ok(StepOutcome::Done("OCR applied".to_string()))
            }
            Action::Pause { seconds } => {
                // Holds only this file's pipeline; other workers keep going.
                std::thread::sleep(Duration::from_secs(*seconds));
                Ok(StepOutcome::Done(format!("paused {}s", seconds)))
            }
            Action::Continue => {
                *continue_requested = true;
                Ok(StepOutcome::Done("will continue to next rule".to_string()))
            }
            Action::Ignore => Ok(StepOutcome::Stop),
        }
    }

    fn resolve_dir(&self, pattern: &str, ctx: &ActionContext) -> Result<PathBuf, ActionError> {
        let resolved = tokens::resolve(pattern, &ctx.token_context());
        if resolved.trim().is_empty() {
            return Err(ActionError::EmptyDestination {
                pattern: pattern.to_string(),
            });
        }
        Ok(PathBuf::from(resolved))
    }

    fn transfer(
        &self,
        ctx: &mut ActionContext,
        dir: &Path,
        on_conflict: ConflictResolution,
        skip_duplicates: bool,
        mode: Transfer,
    ) -> Result<StepOutcome, ActionError> {
        self.fileops.ensure_dir(dir)?;
        let target = dir.join(&ctx.meta.full_name);

        if skip_duplicates && self.is_duplicate(ctx, &target) {
            return Ok(StepOutcome::Skipped(format!(
                "duplicate already at {}",
                target.display()
            )));
        }

        let target = match self.settle_conflict(&target, on_conflict)? {
            Some(path) => path,
            None => {
                return Ok(StepOutcome::Skipped(format!(
                    "destination {} occupied",
                    target.display()
                )))
            }
        };

        match mode {
            Transfer::Move => {
                self.fileops.move_file(ctx.current_path(), &target)?;
                let detail = format!("moved to {}", target.display());
                ctx.relocate(target);
                Ok(StepOutcome::Done(detail))
            }
            Transfer::Copy => {
                self.fileops.copy_file(ctx.current_path(), &target)?;
                Ok(StepOutcome::Done(format!("copied to {}", target.display())))
            }
        }
    }

    fn rename(
        &self,
        ctx: &mut ActionContext,
        pattern: &str,
        on_conflict: ConflictResolution,
    ) -> Result<StepOutcome, ActionError> {
        let new_name = tokens::resolve(pattern, &ctx.token_context());
        if new_name.trim().is_empty() {
            return Err(ActionError::EmptyDestination {
                pattern: pattern.to_string(),
            });
        }

        let target = ctx.current_dir().join(&new_name);
        if target == ctx.current_path() {
            return Ok(StepOutcome::Skipped("name unchanged".to_string()));
        }

        let target = match self.settle_conflict(&target, on_conflict)? {
            Some(path) => path,
            None => {
                return Ok(StepOutcome::Skipped(format!(
                    "destination {} occupied",
                    target.display()
                )))
            }
        };

        self.fileops.move_file(ctx.current_path(), &target)?;
        let detail = format!("renamed to {}", target.display());
        ctx.relocate(target);
        Ok(StepOutcome::Done(detail))
    }

    fn archive(
        &self,
        ctx: &mut ActionContext,
        destination: &str,
        format: ArchiveFormat,
        delete_original: bool,
    ) -> Result<StepOutcome, ActionError> {
        let dir = self.resolve_dir(destination, ctx)?;
        self.fileops.ensure_dir(&dir)?;

        let archive_name = format!("{}.{}", ctx.meta.full_name, format.extension());
        let target = dir.join(archive_name);
        let target = if self.fileops.exists(&target) {
            self.disambiguate(&target)?
        } else {
            target
        };

        self.fileops.archive(ctx.current_path(), &target, format)?;

        if delete_original {
            self.fileops.trash(ctx.current_path())?;
        }

        Ok(StepOutcome::Done(format!(
            "archived to {}",
            target.display()
        )))
    }

    fn unarchive(
        &self,
        ctx: &mut ActionContext,
        destination: Option<&str>,
        delete_archive: bool,
    ) -> Result<StepOutcome, ActionError> {
        let dir = match destination {
            Some(pattern) => self.resolve_dir(pattern, ctx)?,
            None => ctx.current_dir(),
        };

        self.fileops.unarchive(ctx.current_path(), &dir)?;

        if delete_archive {
            self.fileops.trash(ctx.current_path())?;
        }

        Ok(StepOutcome::Done(format!(
            "extracted to {}",
            dir.display()
        )))
    }

    /// Applies the conflict policy to an occupied destination. Returns
    /// `Ok(None)` when the policy says to skip this action.
    fn settle_conflict(
        &self,
        target: &Path,
        policy: ConflictResolution,
    ) -> Result<Option<PathBuf>, ActionError> {
        if !self.fileops.exists(target) {
            return Ok(Some(target.to_path_buf()));
        }

        match policy {
            ConflictResolution::Replace => Ok(Some(target.to_path_buf())),
            ConflictResolution::Skip => Ok(None),
            ConflictResolution::Rename => Ok(Some(self.disambiguate(target)?)),
        }
    }

    /// Deterministic numeric suffixing: `name (1).ext`, `name (2).ext`, ...
    fn disambiguate(&self, target: &Path) -> Result<PathBuf, ActionError> {
        let dir = target.parent().unwrap_or_else(|| Path::new("/"));
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = target
            .extension()
            .map(|e| e.to_string_lossy().to_string());

        for n in 1..=1000 {
            let candidate = match &ext {
                Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
                None => dir.join(format!("{} ({})", stem, n)),
            };
            if !self.fileops.exists(&candidate) {
                return Ok(candidate);
            }
        }

        Err(ActionError::FileOps(FileOpsError::ConflictExhausted {
            path: target.to_path_buf(),
        }))
    }

    fn is_duplicate(&self, ctx: &ActionContext, target: &Path) -> bool {
        if !self.fileops.exists(target) {
            return false;
        }
        match (ctx.meta.size, self.fileops.file_size(target)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

enum Transfer {
    Move,
    Copy,
}

enum StepOutcome {
    Done(String),
    Skipped(String),
    /// `ignore`: terminate the whole list with no further effect.
    Stop,
}

pub(crate) fn action_label(action: &Action) -> &'static str {
    match action {
        Action::Move { .. } => "move",
        Action::Copy { .. } => "copy",
        Action::SortIntoSubfolder { .. } => "sortIntoSubfolder",
        Action::Rename { .. } => "rename",
        Action::Archive { .. } => "archive",
        Action::Unarchive { .. } => "unarchive",
        Action::Delete => "delete",
        Action::DeletePermanently => "deletePermanently",
        Action::RunScript { .. } => "runScript",
        Action::Notify { .. } => "notify",
        Action::Open => "open",
        Action::OpenWith { .. } => "openWith",
        Action::ShowInFileManager => "showInFileManager",
        Action::MakePdfSearchable => "makePdfSearchable",
        Action::Pause { .. } => "pause",
        Action::Continue => "continue",
        Action::Ignore => "ignore",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileops::FsFileOps;
    use crate::metadata::{FsMetadataProvider, MetadataProvider};
    use crate::script::ShellScriptRunner;
    use tempfile::TempDir;

    fn executor(settings: EngineSettings) -> ActionExecutor {
        ActionExecutor::new(
            Arc::new(FsFileOps),
            Arc::new(ShellScriptRunner),
            Arc::new(settings),
        )
    }

    fn context_for(path: &Path) -> ActionContext {
        let meta = FsMetadataProvider.metadata(path).unwrap();
        ActionContext::new(meta, 1)
    }

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_move_with_token_destination() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "invoice.pdf", b"pdf");
        let mut ctx = context_for(&src);
        let year = ctx
            .meta
            .created
            .or(ctx.meta.modified)
            .unwrap_or_else(chrono::Local::now)
            .format("%Y")
            .to_string();

        let dest_pattern = format!("{}/{{year}}", dir.path().join("Documents").display());
        let run = executor(EngineSettings::default()).execute(
            &[Action::Move {
                destination: dest_pattern,
                on_conflict: ConflictResolution::Rename,
                skip_duplicates: false,
            }],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        let expected = dir.path().join("Documents").join(year).join("invoice.pdf");
        assert!(expected.exists());
        assert!(!src.exists());
        assert_eq!(ctx.current_path(), expected.as_path());
    }

    #[test]
    fn test_conflict_rename_appends_suffix() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"new");
        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("doc.txt"), b"old").unwrap();

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::Move {
                destination: dest.display().to_string(),
                on_conflict: ConflictResolution::Rename,
                skip_duplicates: false,
            }],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(dest.join("doc (1).txt").exists());
        assert_eq!(std::fs::read(dest.join("doc.txt")).unwrap(), b"old");
    }

    #[test]
    fn test_conflict_replace_overwrites() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"new");
        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("doc.txt"), b"old").unwrap();

        let mut ctx = context_for(&src);
        executor(EngineSettings::default()).execute(
            &[Action::Move {
                destination: dest.display().to_string(),
                on_conflict: ConflictResolution::Replace,
                skip_duplicates: false,
            }],
            &mut ctx,
        );

        assert_eq!(std::fs::read(dest.join("doc.txt")).unwrap(), b"new");
        assert!(!dest.join("doc (1).txt").exists());
    }

    #[test]
    fn test_conflict_skip_leaves_source_and_continues() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"new");
        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("doc.txt"), b"old").unwrap();

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[
                Action::Move {
                    destination: dest.display().to_string(),
                    on_conflict: ConflictResolution::Skip,
                    skip_duplicates: false,
                },
                Action::Rename {
                    pattern: "kept.txt".to_string(),
                    on_conflict: ConflictResolution::Rename,
                },
            ],
            &mut ctx,
        );

        // Skip aborts only the move; the rename still runs.
        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(matches!(run.steps[0].status, StepStatus::Skipped { .. }));
        assert!(dir.path().join("kept.txt").exists());
    }

    #[test]
    fn test_skip_duplicates() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"same!");
        let dest = dir.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("doc.txt"), b"same!").unwrap();

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::Move {
                destination: dest.display().to_string(),
                on_conflict: ConflictResolution::Rename,
                skip_duplicates: true,
            }],
            &mut ctx,
        );

        assert!(matches!(run.steps[0].status, StepStatus::Skipped { .. }));
        assert!(src.exists());
        assert!(!dest.join("doc (1).txt").exists());
    }

    #[test]
    fn test_rename_sees_current_location_after_move() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "report.txt", b"x");
        let dest = dir.path().join("sorted");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[
                Action::Move {
                    destination: dest.display().to_string(),
                    on_conflict: ConflictResolution::Rename,
                    skip_duplicates: false,
                },
                Action::Rename {
                    pattern: "{name}-final.{ext}".to_string(),
                    on_conflict: ConflictResolution::Rename,
                },
            ],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(dest.join("report-final.txt").exists());
    }

    #[test]
    fn test_sort_into_subfolder() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "photo.jpg", b"img");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::SortIntoSubfolder {
                destination: "{ext}".to_string(),
                on_conflict: ConflictResolution::Rename,
                skip_duplicates: false,
            }],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(dir.path().join("jpg/photo.jpg").exists());
    }

    #[test]
    fn test_ignore_terminates_pipeline() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"x");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[
                Action::Ignore,
                Action::Rename {
                    pattern: "never.txt".to_string(),
                    on_conflict: ConflictResolution::Rename,
                },
            ],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Ignored);
        assert_eq!(run.steps.len(), 1);
        assert!(src.exists());
        assert!(!dir.path().join("never.txt").exists());
    }

    #[test]
    fn test_continue_sets_flag_and_keeps_going() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"x");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[
                Action::Continue,
                Action::Rename {
                    pattern: "after.txt".to_string(),
                    on_conflict: ConflictResolution::Rename,
                },
            ],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(run.continue_requested);
        assert!(dir.path().join("after.txt").exists());
    }

    #[test]
    fn test_permanent_delete_rejected_when_disabled() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "precious.txt", b"x");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::DeletePermanently],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Failed { index: 0 });
        // No filesystem mutation happened.
        assert!(src.exists());
    }

    #[test]
    fn test_permanent_delete_with_capability() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doomed.txt", b"x");

        let settings = EngineSettings {
            allow_permanent_delete: true,
            ..Default::default()
        };
        let mut ctx = context_for(&src);
        let run = executor(settings).execute(&[Action::DeletePermanently], &mut ctx);

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(!src.exists());
    }

    #[test]
    fn test_failing_action_stops_pipeline() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"x");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[
                Action::RunScript {
                    command: "exit 7".to_string(),
                },
                Action::Rename {
                    pattern: "never.txt".to_string(),
                    on_conflict: ConflictResolution::Rename,
                },
            ],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Failed { index: 0 });
        assert_eq!(run.steps.len(), 1);
        assert!(!dir.path().join("never.txt").exists());
    }

    #[test]
    fn test_run_script_with_tokens() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "data.csv", b"x");
        let marker = dir.path().join("marker-data");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::RunScript {
                command: format!("touch {}/marker-{{name}}", dir.path().display()),
            }],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(marker.exists());
    }

    #[test]
    fn test_archive_zip_keeps_original_by_default() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "doc.txt", b"content");
        let dest = dir.path().join("backups");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::Archive {
                destination: dest.display().to_string(),
                format: ArchiveFormat::Zip,
                delete_original: false,
            }],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Completed);
        assert!(dest.join("doc.txt.zip").exists());
        assert!(src.exists());
    }

    #[test]
    fn test_ocr_rejected_when_disabled() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "scan.pdf", b"pdf");

        let mut ctx = context_for(&src);
        let run = executor(EngineSettings::default()).execute(
            &[Action::MakePdfSearchable],
            &mut ctx,
        );

        assert_eq!(run.outcome, PipelineOutcome::Failed { index: 0 });
    }
}
