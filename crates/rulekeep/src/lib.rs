pub mod error;
pub mod fileops;
pub mod matcher;
pub mod metadata;
pub mod pipeline;
pub mod preview;
pub mod rule;
pub mod scheduler;
pub mod script;
pub mod settings;
pub mod tokens;

pub use error::{ActionError, FileOpsError, Result, RuleError, RulekeepError, SchedulerError};
pub use fileops::{FileOps, FsFileOps};
pub use matcher::RuleMatcher;
pub use metadata::{FileKind, FileMetadata, FsMetadataProvider, MetadataProvider};
pub use pipeline::{ActionContext, ActionExecutor, PipelineOutcome, PipelineRun};
pub use preview::{FilePreview, PreviewDebouncer, PreviewService};
pub use rule::{load_rules, load_rules_from_str, normalize_positions, validate_rule, Rule};
pub use scheduler::{FileJob, FileReport, RuleScheduler, SchedulerPool};
pub use settings::EngineSettings;
pub use tokens::TokenContext;
