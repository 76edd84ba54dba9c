use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One company to research. Seed hints come from the input CSV, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyQuery {
    pub name: String,
    pub domain: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
}

impl CompanyQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.domain = if domain.trim().is_empty() {
            None
        } else {
            Some(domain.trim().to_string())
        };
        self
    }

    /// Name with quotes stripped, safe to embed in a quoted search query.
    pub fn search_name(&self) -> String {
        self.name.replace(['"', '\''], "").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    Website,
    Registry,
    Search,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Website => "Website",
            SourceKind::Registry => "Registry",
            SourceKind::Search => "Search",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Scraped,
    Failed,
    NotFound,
    NotNeeded,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Scraped => "scraped",
            FindingStatus::Failed => "failed",
            FindingStatus::NotFound => "not_found",
            FindingStatus::NotNeeded => "not_needed",
        }
    }
}

/// Labelled facts a registry listing (or a site footer) can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryField {
    VatNumber,
    AtecoCode,
    LegalRepresentative,
    FoundedDate,
    ShareCapital,
    ActivityStatus,
    Pec,
    Address,
    City,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneCandidate {
    /// As written on the page.
    pub display: String,
    /// Separators stripped, used for deduplication.
    pub digits: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Contact,
    About,
    Team,
    Legal,
    Footer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAttempt {
    pub kind: PageKind,
    pub url: String,
    pub success: bool,
}

/// Everything one source found for one company. Never mutated after the
/// fetcher hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFinding {
    pub kind: SourceKind,
    pub status: FindingStatus,
    pub fields: BTreeMap<RegistryField, String>,
    pub people: Vec<PersonRecord>,
    pub emails: Vec<String>,
    pub phones: Vec<PhoneCandidate>,
    pub pages: Vec<PageAttempt>,
    pub error: Option<String>,
}

impl SourceFinding {
    fn empty(kind: SourceKind, status: FindingStatus) -> Self {
        Self {
            kind,
            status,
            fields: BTreeMap::new(),
            people: Vec::new(),
            emails: Vec::new(),
            phones: Vec::new(),
            pages: Vec::new(),
            error: None,
        }
    }

    pub fn scraped(kind: SourceKind) -> Self {
        Self::empty(kind, FindingStatus::Scraped)
    }

    pub fn failed(kind: SourceKind, error: impl Into<String>) -> Self {
        let mut finding = Self::empty(kind, FindingStatus::Failed);
        finding.error = Some(error.into());
        finding
    }

    pub fn not_found(kind: SourceKind) -> Self {
        Self::empty(kind, FindingStatus::NotFound)
    }

    pub fn not_needed(kind: SourceKind) -> Self {
        Self::empty(kind, FindingStatus::NotNeeded)
    }

    pub fn with_pages(mut self, pages: Vec<PageAttempt>) -> Self {
        self.pages = pages;
        self
    }

    pub fn is_usable(&self) -> bool {
        self.status == FindingStatus::Scraped
    }

    pub fn field(&self, field: RegistryField) -> Option<&str> {
        self.fields
            .get(&field)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn pages_scraped(&self) -> usize {
        self.pages.iter().filter(|p| p.success).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactSource {
    Website,
    Registry,
    Search,
    #[default]
    None,
}

impl From<SourceKind> for ContactSource {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Website => ContactSource::Website,
            SourceKind::Registry => ContactSource::Registry,
            SourceKind::Search => ContactSource::Search,
        }
    }
}

impl fmt::Display for ContactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContactSource::Website => "website",
            ContactSource::Registry => "registry",
            ContactSource::Search => "web_search",
            ContactSource::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: ContactSource,
}

impl Contact {
    /// A contact is reachable when it carries an email or a phone number.
    pub fn is_reachable(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.email) || present(&self.phone)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub domain: Option<String>,
    pub status: Option<String>,
    pub founded_year: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub ateco_code: Option<String>,
    pub vat_number: Option<String>,
    pub share_capital: Option<String>,
    pub industry: Option<String>,
}

/// Graph nodes, in the order a run may visit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStage {
    Start,
    WebsiteFetch,
    RegistryFetch,
    ContactCheck,
    SkipSearch,
    SearchFetch,
    ProfileMerge,
    RenderReport,
    Persist,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    text: String,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(text: String, generated_at: DateTime<Utc>) -> Self {
        Self { text, generated_at }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// State threaded through one workflow run. Stages only ever add to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub query: CompanyQuery,
    pub findings: Vec<SourceFinding>,
    pub contact: Contact,
    pub profile: CompanyProfile,
    pub report: Option<Report>,
    pub report_path: Option<String>,
    pub trace: Vec<WorkflowStage>,
}

impl RunState {
    pub fn new(query: CompanyQuery) -> Self {
        Self {
            query,
            findings: Vec::new(),
            contact: Contact::default(),
            profile: CompanyProfile::default(),
            report: None,
            report_path: None,
            trace: vec![WorkflowStage::Start],
        }
    }

    pub fn add_finding(&mut self, finding: SourceFinding) {
        self.findings.push(finding);
    }

    pub fn finding(&self, kind: SourceKind) -> Option<&SourceFinding> {
        self.findings.iter().find(|f| f.kind == kind)
    }

    pub fn enter(&mut self, stage: WorkflowStage) {
        self.trace.push(stage);
    }

    pub fn visited(&self, stage: WorkflowStage) -> usize {
        self.trace.iter().filter(|s| **s == stage).count()
    }

    pub fn has_contact(&self) -> bool {
        self.contact.is_reachable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_blank_domain_is_none() {
        let query = CompanyQuery::new("Acme Srl").with_domain("  ");
        assert_eq!(query.domain, None);

        let query = CompanyQuery::new("Acme Srl").with_domain(" acme.it ");
        assert_eq!(query.domain.as_deref(), Some("acme.it"));
    }

    #[test]
    fn test_search_name_strips_quotes() {
        let query = CompanyQuery::new("L'Officina \"Rossi\"");
        assert_eq!(query.search_name(), "LOfficina Rossi");
    }

    #[test]
    fn test_failed_finding_keeps_error() {
        let finding = SourceFinding::failed(SourceKind::Website, "timed out");
        assert_eq!(finding.status, FindingStatus::Failed);
        assert_eq!(finding.error.as_deref(), Some("timed out"));
        assert!(!finding.is_usable());
    }

    #[test]
    fn test_blank_field_reads_as_missing() {
        let mut finding = SourceFinding::scraped(SourceKind::Registry);
        finding.fields.insert(RegistryField::Pec, "  ".to_string());
        assert_eq!(finding.field(RegistryField::Pec), None);
    }

    #[test]
    fn test_contact_reachability() {
        let named_only = Contact {
            name: Some("Anna Bianchi".to_string()),
            source: ContactSource::Registry,
            ..Default::default()
        };
        assert!(!named_only.is_reachable());

        let with_phone = Contact {
            phone: Some("02 1234567".to_string()),
            source: ContactSource::Website,
            ..Default::default()
        };
        assert!(with_phone.is_reachable());
    }

    #[test]
    fn test_run_state_tracks_stages() {
        let mut state = RunState::new(CompanyQuery::new("Acme Srl"));
        state.enter(WorkflowStage::ContactCheck);
        state.enter(WorkflowStage::ContactCheck);
        assert_eq!(state.visited(WorkflowStage::Start), 1);
        assert_eq!(state.visited(WorkflowStage::ContactCheck), 2);
        assert_eq!(state.visited(WorkflowStage::SearchFetch), 0);
    }
}
