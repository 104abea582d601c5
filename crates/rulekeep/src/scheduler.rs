use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info, warn};
use tracing::info_span;
use walkdir::WalkDir;

use crate::error::SchedulerError;
use crate::fileops::FileOps;
use crate::matcher::RuleMatcher;
use crate::metadata::MetadataProvider;
use crate::pipeline::{ActionContext, ActionExecutor, PipelineRun};
use crate::rule::Rule;
use crate::script::ScriptRunner;
use crate::settings::EngineSettings;

/// One file to run through a rule list. The rule snapshot is captured when
/// the job is submitted, so an edit mid-batch never changes in-flight work.
pub struct FileJob {
    pub path: PathBuf,
    pub rules: Arc<Vec<Rule>>,
}

/// What happened to one file across the whole rule list.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcomes: Vec<RuleOutcome>,
}

#[derive(Debug)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub rule_name: String,
    pub disposition: RuleDisposition,
}

#[derive(Debug)]
pub enum RuleDisposition {
    /// Rule is disabled; not evaluated at all.
    Disabled,
    /// Conditions evaluated to false. This is a normal outcome.
    NoMatch,
    Matched(PipelineRun),
    /// The file's metadata could not be read.
    Unreadable(String),
}

/// Walks a file through the rules in ascending `position` order.
///
/// After a matching rule's pipeline completes, evaluation stops when the
/// rule has `stopProcessing` set, unless a `continue` action ran. A failed
/// pipeline still honors the same stop semantics for its rule.
pub struct RuleScheduler {
    metadata: Arc<dyn MetadataProvider>,
    script_runner: Arc<dyn ScriptRunner>,
    executor: ActionExecutor,
}

impl RuleScheduler {
    pub fn new(
        fileops: Arc<dyn FileOps>,
        script_runner: Arc<dyn ScriptRunner>,
        metadata: Arc<dyn MetadataProvider>,
        settings: Arc<EngineSettings>,
    ) -> Self {
        let executor = ActionExecutor::new(fileops, Arc::clone(&script_runner), settings);
        Self {
            metadata,
            script_runner,
            executor,
        }
    }

    pub fn process_file(&self, rules: &[Rule], path: &Path, sequence: u64) -> FileReport {
        let _span = info_span!("process_file", file = %path.display()).entered();

        let mut ordered: Vec<&Rule> = rules.iter().collect();
        ordered.sort_by_key(|r| r.position);

        let matcher = RuleMatcher::for_rules(rules, Arc::clone(&self.script_runner));
        let mut outcomes = Vec::new();

        for rule in ordered {
            if !rule.enabled {
                outcomes.push(outcome(rule, RuleDisposition::Disabled));
                continue;
            }

            // Re-read metadata per rule: an earlier pipeline may have moved
            // or renamed the file.
            let meta = match self.metadata.metadata(path_for(&outcomes, path)) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("Stopping rule evaluation for {}: {}", path.display(), e);
                    outcomes.push(outcome(rule, RuleDisposition::Unreadable(e.to_string())));
                    break;
                }
            };

            if !matcher.matches_group(&rule.conditions, &meta) {
                outcomes.push(outcome(rule, RuleDisposition::NoMatch));
                continue;
            }

            debug!("Rule '{}' matched {}", rule.name, meta.path.display());
            let mut ctx = ActionContext::new(meta, sequence);
            let run = self.executor.execute(&rule.actions, &mut ctx);

            let stop = rule.stop_processing && !run.continue_requested;
            outcomes.push(outcome(rule, RuleDisposition::Matched(run)));

            if stop {
                break;
            }
        }

        FileReport {
            path: path.to_path_buf(),
            outcomes,
        }
    }
}

fn outcome(rule: &Rule, disposition: RuleDisposition) -> RuleOutcome {
    RuleOutcome {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        disposition,
    }
}

/// Current location of the file given the pipelines that already ran.
fn path_for<'a>(outcomes: &'a [RuleOutcome], original: &'a Path) -> &'a Path {
    outcomes
        .iter()
        .rev()
        .find_map(|o| match &o.disposition {
            RuleDisposition::Matched(run) => Some(run.final_path.as_path()),
            _ => None,
        })
        .unwrap_or(original)
}

/// Thread pool that fans file jobs out to `RuleScheduler` workers over
/// bounded channels.
pub struct SchedulerPool {
    job_sender: Sender<FileJob>,
    report_receiver: Receiver<FileReport>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    settings: Arc<EngineSettings>,
    sequence: Arc<AtomicU64>,
}

impl SchedulerPool {
    /// Worker count taken from `maxConcurrentRules`.
    pub fn from_settings(
        fileops: Arc<dyn FileOps>,
        script_runner: Arc<dyn ScriptRunner>,
        metadata: Arc<dyn MetadataProvider>,
        settings: Arc<EngineSettings>,
    ) -> Self {
        let worker_count = settings.max_concurrent_rules.max(1);
        Self::new(fileops, script_runner, metadata, settings, worker_count)
    }

    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(
        fileops: Arc<dyn FileOps>,
        script_runner: Arc<dyn ScriptRunner>,
        metadata: Arc<dyn MetadataProvider>,
        settings: Arc<EngineSettings>,
        worker_count: usize,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<FileJob>(worker_count * 2);
        let (report_sender, report_receiver) = bounded::<FileReport>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));
        let sequence = Arc::new(AtomicU64::new(0));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let report_tx = report_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let seq = Arc::clone(&sequence);
            let scheduler = RuleScheduler::new(
                Arc::clone(&fileops),
                Arc::clone(&script_runner),
                Arc::clone(&metadata),
                Arc::clone(&settings),
            );

            let handle = thread::spawn(move || {
                run_worker(worker_id, scheduler, job_rx, report_tx, shutdown_flag, seq);
            });
            workers.push(handle);
        }

        info!("Started {} scheduler workers", worker_count);

        Self {
            job_sender,
            report_receiver,
            workers,
            shutdown,
            settings,
            sequence,
        }
    }

    pub fn submit(&self, job: FileJob) -> std::result::Result<(), SchedulerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(SchedulerError::ChannelClosed);
        }
        self.job_sender
            .send(job)
            .map_err(|_| SchedulerError::ChannelClosed)
    }

    /// Scans `folder` (one level deep) and submits every non-ignored file.
    /// Returns the number of jobs submitted.
    pub fn submit_folder(
        &self,
        folder: &Path,
        rules: Arc<Vec<Rule>>,
    ) -> std::result::Result<usize, SchedulerError> {
        let mut submitted = 0;
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SchedulerError::ScanFailed {
                path: folder.to_path_buf(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.settings.is_ignored(entry.path()) {
                debug!("Ignoring {}", entry.path().display());
                continue;
            }
            self.submit(FileJob {
                path: entry.path().to_path_buf(),
                rules: Arc::clone(&rules),
            })?;
            submitted += 1;
        }
        Ok(submitted)
    }

    pub fn try_recv_report(&self) -> Option<FileReport> {
        self.report_receiver.try_recv().ok()
    }

    pub fn recv_report(&self) -> Option<FileReport> {
        self.report_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down scheduler pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn wait(self) {
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Scheduler worker {} panicked: {:?}", i, e);
            } else {
                debug!("Scheduler worker {} finished", i);
            }
        }

        info!("All scheduler workers have stopped");
    }

    /// Sequence counter shared across workers; drives `{counter}`.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    scheduler: RuleScheduler,
    job_receiver: Receiver<FileJob>,
    report_sender: Sender<FileReport>,
    shutdown: Arc<AtomicBool>,
    sequence: Arc<AtomicU64>,
) {
    debug!("Scheduler worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Scheduler worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!(
                    "Scheduler worker {} processing {}",
                    worker_id,
                    job.path.display()
                );
                let seq = sequence.fetch_add(1, Ordering::Relaxed);
                let report = scheduler.process_file(&job.rules, &job.path, seq);

                if let Err(e) = report_sender.send(report) {
                    warn!("Scheduler worker {} failed to send report: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Scheduler worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Scheduler worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileops::FsFileOps;
    use crate::metadata::FsMetadataProvider;
    use crate::rule::{Action, Condition, ConditionGroup, ConflictResolution, StringOp};
    use crate::script::ShellScriptRunner;
    use tempfile::TempDir;

    fn scheduler() -> RuleScheduler {
        RuleScheduler::new(
            Arc::new(FsFileOps),
            Arc::new(ShellScriptRunner),
            Arc::new(FsMetadataProvider),
            Arc::new(EngineSettings::default()),
        )
    }

    fn ext_rule(folder: &Path, name: &str, ext: &str, actions: Vec<Action>) -> Rule {
        Rule::new(
            folder.to_path_buf(),
            name,
            ConditionGroup::all(vec![Condition::Extension {
                op: StringOp::Is,
                value: ext.to_string(),
                case_sensitive: false,
            }]),
        )
        .with_actions(actions)
    }

    fn move_action(dest: &Path) -> Action {
        Action::Move {
            destination: dest.display().to_string(),
            on_conflict: ConflictResolution::Rename,
            skip_duplicates: false,
        }
    }

    fn marker_rule(folder: &Path, name: &str, ext: &str, marker: &Path, position: u32) -> Rule {
        ext_rule(
            folder,
            name,
            ext,
            vec![Action::RunScript {
                command: format!("touch {}", marker.display()),
            }],
        )
        .with_position(position)
    }

    #[test]
    fn test_rules_run_in_position_order_until_stop() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let first = dir.path().join("ran-first");
        let second = dir.path().join("ran-second");

        // Declaration order is the reverse of position order.
        let rules = vec![
            marker_rule(dir.path(), "second", "txt", &second, 1).with_stop_processing(true),
            marker_rule(dir.path(), "first", "txt", &first, 0).with_stop_processing(true),
        ];

        let report = scheduler().process_file(&rules, &file, 0);

        // Position 0 matched and stopped; position 1 never ran.
        assert!(first.exists());
        assert!(!second.exists());
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].rule_name, "first");
    }

    #[test]
    fn test_stop_processing_false_falls_through() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let first = dir.path().join("ran-first");
        let second = dir.path().join("ran-second");

        let rules = vec![
            marker_rule(dir.path(), "first", "txt", &first, 0).with_stop_processing(false),
            marker_rule(dir.path(), "second", "txt", &second, 1),
        ];

        scheduler().process_file(&rules, &file, 0);

        assert!(first.exists());
        assert!(second.exists());
    }

    #[test]
    fn test_continue_overrides_stop_processing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let second = dir.path().join("ran-second");

        let rules = vec![
            ext_rule(dir.path(), "first", "txt", vec![Action::Continue])
                .with_position(0)
                .with_stop_processing(true),
            marker_rule(dir.path(), "second", "txt", &second, 1),
        ];

        let report = scheduler().process_file(&rules, &file, 0);

        assert!(second.exists());
        assert_eq!(report.outcomes.len(), 2);
    }

    #[test]
    fn test_disabled_rule_is_skipped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let marker = dir.path().join("ran");

        let mut rule = marker_rule(dir.path(), "off", "txt", &marker, 0);
        rule.enabled = false;

        let report = scheduler().process_file(&[rule], &file, 0);

        assert!(!marker.exists());
        assert!(matches!(
            report.outcomes[0].disposition,
            RuleDisposition::Disabled
        ));
    }

    #[test]
    fn test_no_match_is_a_normal_outcome() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();

        let rules = vec![ext_rule(dir.path(), "pdf only", "pdf", vec![])];
        let report = scheduler().process_file(&rules, &file, 0);

        assert!(matches!(
            report.outcomes[0].disposition,
            RuleDisposition::NoMatch
        ));
    }

    #[test]
    fn test_later_rule_sees_moved_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let sorted = dir.path().join("sorted");

        let rules = vec![
            ext_rule(dir.path(), "move", "txt", vec![move_action(&sorted)])
                .with_position(0)
                .with_stop_processing(false),
            ext_rule(
                dir.path(),
                "rename",
                "txt",
                vec![Action::Rename {
                    pattern: "b.{ext}".to_string(),
                    on_conflict: ConflictResolution::Rename,
                }],
            )
            .with_position(1),
        ];

        scheduler().process_file(&rules, &file, 0);

        assert!(sorted.join("b.txt").exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_pool_processes_folder() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"y").unwrap();
        std::fs::write(dir.path().join("notes.md"), b"z").unwrap();
        let sorted = dir.path().join("sorted");

        let rules = Arc::new(vec![ext_rule(
            dir.path(),
            "texts",
            "txt",
            vec![move_action(&sorted)],
        )]);

        let pool = SchedulerPool::new(
            Arc::new(FsFileOps),
            Arc::new(ShellScriptRunner),
            Arc::new(FsMetadataProvider),
            Arc::new(EngineSettings::default()),
            2,
        );

        let submitted = pool.submit_folder(dir.path(), rules).unwrap();
        assert_eq!(submitted, 3);

        for _ in 0..submitted {
            pool.recv_report().unwrap();
        }

        assert!(sorted.join("a.txt").exists());
        assert!(sorted.join("b.txt").exists());
        assert!(dir.path().join("notes.md").exists());

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_pool_respects_ignore_patterns() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"y").unwrap();

        let settings = EngineSettings {
            ignore_patterns: vec![".*".to_string()],
            ..Default::default()
        };

        let pool = SchedulerPool::new(
            Arc::new(FsFileOps),
            Arc::new(ShellScriptRunner),
            Arc::new(FsMetadataProvider),
            Arc::new(settings),
            1,
        );

        let submitted = pool
            .submit_folder(dir.path(), Arc::new(vec![]))
            .unwrap();
        assert_eq!(submitted, 1);

        pool.shutdown();
        pool.wait();
    }
}
