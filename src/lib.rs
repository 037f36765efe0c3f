pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{DuckDuckGoSearch, LocalStorage, OpenAiChat, TopicalSearch};
#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::AppConfig;
pub use crate::core::assistant::Assistant;
pub use crate::core::{AnalysisOutcome, Orchestrator};
pub use utils::error::{FinError, Result};
