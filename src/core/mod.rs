pub mod batch;
pub mod extractor;
pub mod profile;
pub mod report;
pub mod resolver;
pub mod workflow;

pub use crate::domain::model::{CompanyQuery, Contact, RunState, SourceFinding};
pub use crate::domain::ports::{ConfigProvider, SourceFetcher, Storage};
pub use crate::utils::error::Result;
