use crate::domain::model::CompanyQuery;
use crate::utils::error::{ResearchError, Result};
use serde::Deserialize;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// One input row. English headers and the German CRM export headers are
/// both accepted; other columns are ignored.
#[derive(Debug, Deserialize)]
struct CompanyRow {
    #[serde(alias = "Unternehmensname", alias = "company", alias = "company_name")]
    name: String,
    #[serde(default, alias = "Domainname des Unternehmens", alias = "website")]
    domain: Option<String>,
    #[serde(default, alias = "Stadt")]
    city: Option<String>,
    #[serde(default, alias = "Adresszeile")]
    address: Option<String>,
    #[serde(default, alias = "Branche")]
    industry: Option<String>,
}

impl From<CompanyRow> for CompanyQuery {
    fn from(row: CompanyRow) -> Self {
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let mut query = CompanyQuery::new(row.name).with_domain(row.domain.unwrap_or_default());
        query.city = blank_to_none(row.city);
        query.address = blank_to_none(row.address);
        query.industry = blank_to_none(row.industry);
        query
    }
}

const NAME_HEADERS: &[&str] = &["name", "Unternehmensname", "company", "company_name"];

/// Reads every row it can. Rows that cannot be parsed are logged and skipped;
/// bytes that are not UTF-8 (Latin-1 CRM exports) are decoded lossily. Rows
/// with a blank name are kept so the research run can reject and report them.
pub fn read_companies<R: Read>(reader: R) -> Result<Vec<CompanyQuery>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = lossy_record(csv_reader.byte_headers()?);
    if !headers.iter().any(|h| NAME_HEADERS.contains(&h)) {
        return Err(ResearchError::InvalidInput {
            message: format!("company list has no name column (expected one of {})", NAME_HEADERS.join(", ")),
        });
    }

    let mut companies = Vec::new();
    for (line, record) in csv_reader.byte_records().enumerate() {
        let row = record
            .map_err(ResearchError::from)
            .and_then(|record| {
                let mut decoded = lossy_record(&record);
                // short rows: missing trailing columns read as empty
                while decoded.len() < headers.len() {
                    decoded.push_field("");
                }
                Ok(decoded.deserialize::<CompanyRow>(Some(&headers))?)
            });
        match row {
            Ok(row) => {
                if row.name.trim().is_empty() {
                    tracing::warn!("row {} has no company name", line + 2);
                }
                companies.push(CompanyQuery::from(row));
            }
            Err(e) => tracing::warn!("⚠️ Skipping unreadable row {}: {}", line + 2, e),
        }
    }
    Ok(companies)
}

fn lossy_record(record: &csv::ByteRecord) -> csv::StringRecord {
    let mut decoded = csv::StringRecord::with_capacity(record.as_slice().len(), record.len());
    for field in record.iter() {
        decoded.push_field(String::from_utf8_lossy(field).trim());
    }
    decoded
}

pub fn load_companies<P: AsRef<Path>>(path: P) -> Result<Vec<CompanyQuery>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ResearchError::InvalidInput {
                message: format!("company list not found: {}", path.display()),
            }
        } else {
            ResearchError::IoError(e)
        }
    })?;

    let companies = read_companies(file)?;
    tracing::info!("📋 Loaded {} companies from {}", companies.len(), path.display());
    Ok(companies)
}

/// First row whose name contains `name`, ignoring case. A missing list is
/// not an error here; the caller falls back to the bare name.
pub fn find_company<P: AsRef<Path>>(path: P, name: &str) -> Result<Option<CompanyQuery>> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("no company list at {}", path.display());
        return Ok(None);
    }

    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(None);
    }

    Ok(load_companies(path)?
        .into_iter()
        .find(|c| !c.name.trim().is_empty() && c.name.to_lowercase().contains(&needle)))
}
