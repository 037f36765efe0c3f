pub mod assistant;
pub mod critic;
pub mod dataset;
pub mod expert;
pub mod group;
pub mod orchestrator;
pub mod prompts;
pub mod queries;
pub mod report;
pub mod synthesis;

pub use crate::domain::ports::{ChatModel, ConfigProvider, SearchProvider, Storage};
pub use crate::utils::error::Result;
pub use orchestrator::{execution_summary, AnalysisOutcome, ExecutionPlan, Orchestrator};
