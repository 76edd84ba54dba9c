use crate::core::workflow::ResearchWorkflow;
use crate::domain::model::{CompanyQuery, ContactSource, RunState};
use crate::domain::ports::{ConfigProvider, SourceFetcher, Storage};
use crate::utils::error::{ResearchError, Result};
use crate::utils::monitor::ResourceMonitor;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const SUMMARY_FILE: &str = "batch_summary.csv";

#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Gap between the starts of two consecutive company runs.
    pub delay: Duration,
    pub concurrent_companies: usize,
}

impl BatchSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            delay: config.company_delay(),
            concurrent_companies: config.concurrent_companies().max(1),
        }
    }
}

/// One row of `batch_summary.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyOutcome {
    pub index: usize,
    pub company: String,
    pub succeeded: bool,
    pub contact_source: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub report_path: Option<String>,
    pub error: Option<String>,
}

impl CompanyOutcome {
    fn from_state(index: usize, state: &RunState) -> Self {
        Self {
            index,
            company: state.query.name.clone(),
            succeeded: true,
            contact_source: state.contact.source.to_string(),
            contact_name: state.contact.name.clone(),
            email: state.contact.email.clone(),
            phone: state.contact.phone.clone(),
            report_path: state.report_path.clone(),
            error: None,
        }
    }

    fn from_error(index: usize, company: String, error: &ResearchError) -> Self {
        Self::failed(index, company, error.user_friendly_message())
    }

    fn failed(index: usize, company: String, error: String) -> Self {
        Self {
            index,
            company,
            succeeded: false,
            contact_source: ContactSource::None.to_string(),
            contact_name: None,
            email: None,
            phone: None,
            report_path: None,
            error: Some(error),
        }
    }

    pub fn has_contact(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub with_contact: usize,
    pub failed: usize,
    /// In input order.
    pub outcomes: Vec<CompanyOutcome>,
}

impl BatchSummary {
    fn from_outcomes(mut outcomes: Vec<CompanyOutcome>) -> Self {
        outcomes.sort_by_key(|o| o.index);
        let successful = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            total: outcomes.len(),
            successful,
            with_contact: outcomes.iter().filter(|o| o.has_contact()).count(),
            failed: outcomes.len() - successful,
            outcomes,
        }
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for outcome in &self.outcomes {
            writer.serialize(outcome)?;
        }
        writer.into_inner().map_err(|e| ResearchError::IoError(e.into_error()))
    }
}

/// Runs the research workflow over many companies. Runs share nothing but the
/// workflow itself, which is read-only.
pub struct BatchRunner<W, R, Q, S> {
    workflow: Arc<ResearchWorkflow<W, R, Q, S>>,
    storage: S,
    settings: BatchSettings,
    monitor: ResourceMonitor,
}

impl<W, R, Q, S> BatchRunner<W, R, Q, S>
where
    W: SourceFetcher + 'static,
    R: SourceFetcher + 'static,
    Q: SourceFetcher + 'static,
    S: Storage + 'static,
{
    pub fn new(workflow: Arc<ResearchWorkflow<W, R, Q, S>>, storage: S, settings: BatchSettings) -> Self {
        Self {
            workflow,
            storage,
            settings,
            monitor: ResourceMonitor::default(),
        }
    }

    pub fn with_monitor(mut self, monitor: ResourceMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub async fn run(&self, companies: Vec<CompanyQuery>) -> Result<BatchSummary> {
        let total = companies.len();
        tracing::info!(
            "🚀 Starting batch of {} companies (concurrency {}, delay {:?})",
            total,
            self.settings.concurrent_companies,
            self.settings.delay
        );
        self.monitor.log_stats("batch_start");

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrent_companies.max(1)));
        let mut tasks = JoinSet::new();
        let mut started = HashMap::new();

        for (index, query) in companies.into_iter().enumerate() {
            if index > 0 && !self.settings.delay.is_zero() {
                tokio::time::sleep(self.settings.delay).await;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let workflow = Arc::clone(&self.workflow);

            tracing::info!("[{}/{}] {}", index + 1, total, query.name);
            let company = query.name.clone();
            let handle = tasks.spawn(async move {
                let _permit = permit;
                let company = query.name.clone();
                match workflow.run(query).await {
                    Ok(state) => CompanyOutcome::from_state(index, &state),
                    Err(e) => {
                        tracing::error!(company = %company, "❌ Research failed: {}", e);
                        CompanyOutcome::from_error(index, company, &e)
                    }
                }
            });
            started.insert(handle.id(), (index, company));
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("company task aborted: {}", e);
                    if let Some((index, company)) = started.remove(&e.id()) {
                        outcomes.push(CompanyOutcome::failed(index, company, format!("research aborted: {}", e)));
                    }
                }
            }
        }

        let summary = BatchSummary::from_outcomes(outcomes);
        self.storage.write_file(SUMMARY_FILE, &summary.to_csv()?).await?;

        tracing::info!(
            total = summary.total,
            successful = summary.successful,
            with_contact = summary.with_contact,
            failed = summary.failed,
            "✅ Batch complete, summary at {}",
            self.storage.location(SUMMARY_FILE)
        );
        self.monitor.log_final_stats();
        Ok(summary)
    }
}
