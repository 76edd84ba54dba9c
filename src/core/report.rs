use crate::domain::model::{
    CompanyProfile, CompanyQuery, Contact, ContactSource, FindingStatus, Report, SourceFinding, SourceKind,
};
use chrono::{DateTime, Utc};

pub const PLACEHOLDER: &str = "N/A";

/// Renders the fixed markdown template.
///
/// Every field line is always present, with `N/A` standing in for missing
/// values, so reports can be parsed line by line.
pub fn render(
    query: &CompanyQuery,
    contact: &Contact,
    profile: &CompanyProfile,
    findings: &[SourceFinding],
    generated_at: DateTime<Utc>,
) -> Report {
    let source = match contact.source {
        ContactSource::None => PLACEHOLDER.to_string(),
        other => other.to_string(),
    };

    let lines = vec![
        format!("# {}", query.name.trim()),
        String::new(),
        "## Contact".to_string(),
        field("Name", &contact.name),
        field("Role", &contact.role),
        field("Email", &contact.email),
        field("Phone", &contact.phone),
        format!("- **Source**: {}", source),
        String::new(),
        "## Company Profile".to_string(),
        field("Domain", &profile.domain),
        field("VAT Number", &profile.vat_number),
        field("Status", &profile.status),
        field("Founded", &profile.founded_year),
        field("City", &profile.city),
        field("Address", &profile.address),
        field("Industry (ATECO)", &profile.ateco_code),
        field("Industry", &profile.industry),
        field("Share Capital", &profile.share_capital),
        String::new(),
        "## Data Sources".to_string(),
        format!("- Website: {}", website_status(findings)),
        format!("- Registry: {}", registry_status(findings)),
        format!("- Web Search: {}", search_status(findings)),
        String::new(),
        "---".to_string(),
        format!("*Generated: {}*", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];

    let mut text = lines.join("\n");
    text.push('\n');
    Report::new(text, generated_at)
}

/// File stem for a company's report: word characters, spaces and hyphens
/// kept, whitespace runs turned into `_`, at most 100 characters.
pub fn report_file_stem(company_name: &str) -> String {
    let kept: String = company_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let stem: String = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(100)
        .collect();

    if stem.is_empty() {
        "unknown".to_string()
    } else {
        stem
    }
}

fn field(label: &str, value: &Option<String>) -> String {
    let value = value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(PLACEHOLDER);
    format!("- **{}**: {}", label, value)
}

fn status_of(findings: &[SourceFinding], kind: SourceKind) -> Option<&SourceFinding> {
    findings.iter().find(|f| f.kind == kind)
}

fn website_status(findings: &[SourceFinding]) -> String {
    match status_of(findings, SourceKind::Website) {
        Some(f) if f.status == FindingStatus::Scraped => {
            format!("scraped ({} pages)", f.pages_scraped())
        }
        Some(f) => f.status.as_str().to_string(),
        None => FindingStatus::Failed.as_str().to_string(),
    }
}

fn registry_status(findings: &[SourceFinding]) -> &'static str {
    status_of(findings, SourceKind::Registry)
        .map(|f| f.status.as_str())
        .unwrap_or(FindingStatus::NotFound.as_str())
}

fn search_status(findings: &[SourceFinding]) -> &'static str {
    match status_of(findings, SourceKind::Search).map(|f| f.status) {
        Some(FindingStatus::Scraped) => "used",
        Some(FindingStatus::NotFound) => "used (no results)",
        Some(FindingStatus::Failed) => "failed",
        Some(FindingStatus::NotNeeded) | None => "not_needed",
    }
}
