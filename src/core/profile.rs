use crate::core::extractor::founded_year;
use crate::domain::model::{CompanyProfile, CompanyQuery, RegistryField, SourceFinding, SourceKind};

const MERGE_ORDER: [SourceKind; 3] = [SourceKind::Registry, SourceKind::Search, SourceKind::Website];

/// Fills every profile field from the first of Registry, Search, Website
/// that supplies it. Fields are independent of each other; the query's seed
/// hints only fill what no finding had.
pub fn merge(query: &CompanyQuery, findings: &[SourceFinding]) -> CompanyProfile {
    let ordered: Vec<&SourceFinding> = MERGE_ORDER
        .iter()
        .flat_map(|kind| findings.iter().filter(move |f| f.kind == *kind && f.is_usable()))
        .collect();

    let first = |field: RegistryField| -> Option<String> {
        ordered
            .iter()
            .find_map(|f| f.field(field))
            .map(str::to_string)
    };

    CompanyProfile {
        domain: query.domain.clone(),
        status: first(RegistryField::ActivityStatus),
        founded_year: first(RegistryField::FoundedDate).and_then(|raw| founded_year(&raw)),
        city: first(RegistryField::City).or_else(|| hint(&query.city)),
        address: first(RegistryField::Address).or_else(|| hint(&query.address)),
        ateco_code: first(RegistryField::AtecoCode),
        vat_number: first(RegistryField::VatNumber),
        share_capital: first(RegistryField::ShareCapital),
        industry: hint(&query.industry),
    }
}

fn hint(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
