use crate::core::{profile, report, resolver};
use crate::domain::model::{CompanyQuery, RunState, SourceFinding, SourceKind, WorkflowStage};
use crate::domain::ports::{ConfigProvider, SourceFetcher, Storage};
use crate::utils::error::{ResearchError, Result};
use crate::utils::validation::Validate;
use chrono::Utc;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub fetch_timeout: Duration,
    pub write_json: bool,
}

impl WorkflowSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            write_json: config.output_formats().iter().any(|f| f == "json"),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(60),
            write_json: false,
        }
    }
}

impl Validate for CompanyQuery {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ResearchError::InvalidInput {
                message: "company name is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// The research graph for one company:
///
/// ```text
/// Start -> {WebsiteFetch || RegistryFetch} -> ContactCheck
///       -> (has contact ? SkipSearch : SearchFetch -> ContactCheck)
///       -> ProfileMerge -> RenderReport -> Persist -> Done
/// ```
pub struct ResearchWorkflow<W, R, Q, S> {
    website: W,
    registry: R,
    search: Q,
    storage: S,
    settings: WorkflowSettings,
}

impl<W, R, Q, S> ResearchWorkflow<W, R, Q, S>
where
    W: SourceFetcher,
    R: SourceFetcher,
    Q: SourceFetcher,
    S: Storage,
{
    pub fn new(website: W, registry: R, search: Q, storage: S, settings: WorkflowSettings) -> Self {
        Self {
            website,
            registry,
            search,
            storage,
            settings,
        }
    }

    /// Runs the graph once. Only malformed input or a failed write ends a
    /// run with an error; unreachable sources just degrade the report.
    pub async fn run(&self, query: CompanyQuery) -> Result<RunState> {
        query.validate()?;

        let span = tracing::info_span!("research", company = %query.name);
        self.run_graph(RunState::new(query)).instrument(span).await
    }

    async fn run_graph(&self, mut state: RunState) -> Result<RunState> {
        tracing::info!("📥 Fetching website and registry");
        state.enter(WorkflowStage::WebsiteFetch);
        state.enter(WorkflowStage::RegistryFetch);
        let (website, registry) = tokio::join!(
            self.bounded_fetch(&self.website, &state.query),
            self.bounded_fetch(&self.registry, &state.query),
        );
        state.add_finding(website);
        state.add_finding(registry);

        self.check_contact(&mut state);

        if state.has_contact() {
            tracing::info!("⏭️ Contact found, skipping web search");
            state.enter(WorkflowStage::SkipSearch);
            state.add_finding(SourceFinding::not_needed(SourceKind::Search));
        } else {
            tracing::info!("🔎 No contact yet, falling back to web search");
            state.enter(WorkflowStage::SearchFetch);
            let search = self.bounded_fetch(&self.search, &state.query).await;
            state.add_finding(search);
            self.check_contact(&mut state);
        }

        state.enter(WorkflowStage::ProfileMerge);
        state.profile = profile::merge(&state.query, &state.findings);

        state.enter(WorkflowStage::RenderReport);
        state.report = Some(report::render(
            &state.query,
            &state.contact,
            &state.profile,
            &state.findings,
            Utc::now(),
        ));

        state.enter(WorkflowStage::Persist);
        self.persist(&mut state).await?;

        state.enter(WorkflowStage::Done);
        tracing::info!(
            contact_source = %state.contact.source,
            reachable = state.has_contact(),
            "✅ Research complete"
        );
        Ok(state)
    }

    async fn bounded_fetch<F: SourceFetcher>(&self, fetcher: &F, query: &CompanyQuery) -> SourceFinding {
        let kind = fetcher.kind();
        match tokio::time::timeout(self.settings.fetch_timeout, fetcher.fetch(query)).await {
            Ok(finding) => {
                tracing::debug!(
                    source = %kind,
                    status = finding.status.as_str(),
                    emails = finding.emails.len(),
                    phones = finding.phones.len(),
                    people = finding.people.len(),
                    "fetch finished"
                );
                finding
            }
            Err(_) => {
                tracing::warn!(source = %kind, "fetch timed out after {:?}", self.settings.fetch_timeout);
                let error = ResearchError::FetchFailed {
                    kind,
                    message: format!("timed out after {}s", self.settings.fetch_timeout.as_secs_f32()),
                };
                SourceFinding::failed(kind, error.to_string())
            }
        }
    }

    fn check_contact(&self, state: &mut RunState) {
        state.enter(WorkflowStage::ContactCheck);
        state.contact = resolver::resolve(&state.findings);
        tracing::debug!(source = %state.contact.source, "contact resolved");
    }

    async fn persist(&self, state: &mut RunState) -> Result<()> {
        let Some(rendered) = state.report.as_ref() else {
            return Err(ResearchError::InvalidInput {
                message: "nothing rendered to persist".to_string(),
            });
        };

        let stem = report::report_file_stem(&state.query.name);
        let markdown_path = format!("{}.md", stem);
        self.storage
            .write_file(&markdown_path, rendered.as_str().as_bytes())
            .await?;
        state.report_path = Some(self.storage.location(&markdown_path));

        if self.settings.write_json {
            let json = serde_json::to_vec_pretty(&*state)?;
            self.storage.write_file(&format!("{}.json", stem), &json).await?;
        }

        tracing::info!("💾 Report saved to: {}", state.report_path.as_deref().unwrap_or_default());
        Ok(())
    }
}
