pub mod context;
pub mod describe;
pub mod executor;

pub use context::ActionContext;
pub use describe::describe_actions;
pub use executor::{ActionExecutor, PipelineOutcome, PipelineRun, StepResult, StepStatus};
