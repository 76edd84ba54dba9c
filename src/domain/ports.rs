use crate::domain::model::{CompanyQuery, SourceFinding, SourceKind};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Where `path` ends up, for display.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn output_dir(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn fetch_timeout(&self) -> Duration;
    fn company_delay(&self) -> Duration;
    fn concurrent_companies(&self) -> usize;
}

/// A data source the workflow can ask about a company.
///
/// Implementations must not fail: network errors, timeouts and empty
/// responses are reported through the returned finding's status.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn kind(&self) -> SourceKind;
    async fn fetch(&self, query: &CompanyQuery) -> SourceFinding;
}
