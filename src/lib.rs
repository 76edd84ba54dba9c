pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::ResearchConfig;

pub use adapters::{LocalStorage, RegistryFetcher, SearchFetcher, WebsiteFetcher};
pub use crate::core::batch::{BatchRunner, BatchSettings, BatchSummary};
pub use crate::core::workflow::{ResearchWorkflow, WorkflowSettings};
pub use domain::model::{CompanyQuery, Contact, ContactSource, RunState};
pub use utils::error::{ResearchError, Result};
