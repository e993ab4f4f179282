//! Build steps, the step registry, and the orchestrator that runs them.

pub mod orchestrator;
pub mod registry;
pub mod step;
pub mod steps;

pub use orchestrator::{BuildSummary, Orchestrator, StepReport};
pub use registry::StepRegistry;
pub use step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};
