use crate::core::extractor::{is_sales_role, preferred_email};
use crate::domain::model::{Contact, ContactSource, PersonRecord, RegistryField, SourceFinding, SourceKind};

const LEGAL_REPRESENTATIVE: &str = "Legal Representative";
const FALLBACK_ORDER: [SourceKind; 3] = [SourceKind::Website, SourceKind::Registry, SourceKind::Search];

/// Picks the single best contact out of all findings.
///
/// Tiers are tried in a strict order and the first one that produces a
/// record wins as a whole, so name, role, email and phone always describe the
/// same person or mailbox:
///
/// 1. a Website person with a sales-like role
/// 2. any other named Website person
/// 3. the Registry legal representative, with the PEC address if known
/// 4. the first email (else phone) across Website, Registry, Search
///
/// Only findings with status `scraped` take part.
pub fn resolve(findings: &[SourceFinding]) -> Contact {
    let website = usable(findings, SourceKind::Website);

    if let Some(website) = website {
        if let Some(person) = website
            .people
            .iter()
            .find(|p| p.role.as_deref().is_some_and(is_sales_role))
        {
            return website_contact(website, person);
        }
        if let Some(person) = website.people.iter().find(|p| !p.name.trim().is_empty()) {
            return website_contact(website, person);
        }
    }

    if let Some(registry) = usable(findings, SourceKind::Registry) {
        if let Some(name) = registry.field(RegistryField::LegalRepresentative) {
            return Contact {
                name: Some(name.to_string()),
                role: Some(LEGAL_REPRESENTATIVE.to_string()),
                email: registry.field(RegistryField::Pec).map(str::to_string),
                phone: None,
                source: ContactSource::Registry,
            };
        }
    }

    general_fallback(findings)
}

fn usable(findings: &[SourceFinding], kind: SourceKind) -> Option<&SourceFinding> {
    findings.iter().find(|f| f.kind == kind && f.is_usable())
}

fn website_contact(website: &SourceFinding, person: &PersonRecord) -> Contact {
    Contact {
        name: Some(person.name.clone()),
        role: non_blank(person.role.as_deref()),
        email: non_blank(person.email.as_deref()).or_else(|| finding_email(website)),
        phone: non_blank(person.phone.as_deref()).or_else(|| finding_phone(website)),
        source: ContactSource::Website,
    }
}

fn general_fallback(findings: &[SourceFinding]) -> Contact {
    let ordered: Vec<&SourceFinding> = FALLBACK_ORDER
        .iter()
        .filter_map(|kind| usable(findings, *kind))
        .collect();

    let email = ordered
        .iter()
        .find_map(|f| finding_email(f).map(|email| (f.kind, email)));
    let phone = ordered
        .iter()
        .find_map(|f| finding_phone(f).map(|phone| (f.kind, phone)));

    let source = match (&email, &phone) {
        (Some((kind, _)), _) | (None, Some((kind, _))) => ContactSource::from(*kind),
        (None, None) => ContactSource::None,
    };

    Contact {
        name: None,
        role: None,
        email: email.map(|(_, e)| e),
        phone: phone.map(|(_, p)| p),
        source,
    }
}

fn finding_email(finding: &SourceFinding) -> Option<String> {
    preferred_email(&finding.emails)
        .or_else(|| finding.field(RegistryField::Pec))
        .map(str::to_string)
}

fn finding_phone(finding: &SourceFinding) -> Option<String> {
    finding.phones.first().map(|p| p.display.clone())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PhoneCandidate;

    fn person(name: &str, role: Option<&str>, email: Option<&str>) -> PersonRecord {
        PersonRecord {
            name: name.to_string(),
            role: role.map(str::to_string),
            email: email.map(str::to_string),
            phone: None,
        }
    }

    fn phone(display: &str) -> PhoneCandidate {
        PhoneCandidate {
            display: display.to_string(),
            digits: display.chars().filter(char::is_ascii_digit).collect(),
        }
    }

    fn registry_with_rep(rep: &str, pec: Option<&str>) -> SourceFinding {
        let mut registry = SourceFinding::scraped(SourceKind::Registry);
        registry
            .fields
            .insert(RegistryField::LegalRepresentative, rep.to_string());
        if let Some(pec) = pec {
            registry.fields.insert(RegistryField::Pec, pec.to_string());
        }
        registry
    }

    #[test]
    fn test_sales_record_on_website_wins() {
        let mut website = SourceFinding::scraped(SourceKind::Website);
        website.people.push(person("Mario Rossi", Some("Sales Manager"), Some("m.rossi@acme.it")));

        let contact = resolve(&[website]);
        assert_eq!(
            contact,
            Contact {
                name: Some("Mario Rossi".to_string()),
                role: Some("Sales Manager".to_string()),
                email: Some("m.rossi@acme.it".to_string()),
                phone: None,
                source: ContactSource::Website,
            }
        );
    }

    #[test]
    fn test_sales_record_beats_earlier_manager_and_registry() {
        let mut website = SourceFinding::scraped(SourceKind::Website);
        website.people.push(person("Luca Neri", Some("CEO"), Some("ceo@acme.it")));
        website.people.push(person("Sara Galli", Some("Direttore Commerciale"), None));
        website.emails.push("info@acme.it".to_string());
        website.phones.push(phone("02 1234567"));

        let mut search = SourceFinding::scraped(SourceKind::Search);
        search.emails.push("sales@acme.it".to_string());

        let findings = vec![registry_with_rep("Anna Bianchi", Some("acme@pec.it")), search, website];
        let contact = resolve(&findings);

        assert_eq!(contact.source, ContactSource::Website);
        assert_eq!(contact.name.as_deref(), Some("Sara Galli"));
        assert_eq!(contact.role.as_deref(), Some("Direttore Commerciale"));
        // completed from the same website finding
        assert_eq!(contact.email.as_deref(), Some("info@acme.it"));
        assert_eq!(contact.phone.as_deref(), Some("02 1234567"));
    }

    #[test]
    fn test_any_named_website_record_before_registry() {
        let mut website = SourceFinding::scraped(SourceKind::Website);
        website.people.push(person("Luca Neri", Some("CEO"), None));

        let contact = resolve(&[website, registry_with_rep("Anna Bianchi", None)]);
        assert_eq!(contact.source, ContactSource::Website);
        assert_eq!(contact.name.as_deref(), Some("Luca Neri"));
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_legal_representative_with_pec_when_website_failed() {
        let website = SourceFinding::failed(SourceKind::Website, "connection refused");
        let contact = resolve(&[website, registry_with_rep("Anna Bianchi", Some("acme@pec.it"))]);

        assert_eq!(
            contact,
            Contact {
                name: Some("Anna Bianchi".to_string()),
                role: Some("Legal Representative".to_string()),
                email: Some("acme@pec.it".to_string()),
                phone: None,
                source: ContactSource::Registry,
            }
        );
    }

    #[test]
    fn test_fallback_takes_first_email_in_source_order() {
        let mut website = SourceFinding::scraped(SourceKind::Website);
        website.phones.push(phone("0521 123456"));

        let mut registry = SourceFinding::scraped(SourceKind::Registry);
        registry.fields.insert(RegistryField::Pec, "acme@pec.it".to_string());

        let mut search = SourceFinding::scraped(SourceKind::Search);
        search.emails.push("info@acme.it".to_string());

        let contact = resolve(&[search, registry, website]);
        assert_eq!(contact.email.as_deref(), Some("acme@pec.it"));
        assert_eq!(contact.phone.as_deref(), Some("0521 123456"));
        assert_eq!(contact.source, ContactSource::Registry);
        assert_eq!(contact.name, None);
    }

    #[test]
    fn test_fallback_phone_only_sets_phone_source() {
        let mut search = SourceFinding::scraped(SourceKind::Search);
        search.phones.push(phone("+39 02 1234567"));

        let contact = resolve(&[SourceFinding::not_found(SourceKind::Registry), search]);
        assert_eq!(contact.phone.as_deref(), Some("+39 02 1234567"));
        assert_eq!(contact.source, ContactSource::Search);
    }

    #[test]
    fn test_failed_findings_never_contribute() {
        let mut website = SourceFinding::failed(SourceKind::Website, "timeout");
        website.emails.push("stale@acme.it".to_string());

        let contact = resolve(&[website]);
        assert_eq!(contact, Contact::default());
        assert_eq!(contact.source, ContactSource::None);
    }

    #[test]
    fn test_nothing_found_yields_empty_contact() {
        let findings = vec![
            SourceFinding::scraped(SourceKind::Website),
            SourceFinding::not_found(SourceKind::Registry),
            SourceFinding::scraped(SourceKind::Search),
        ];
        let contact = resolve(&findings);
        assert_eq!(contact, Contact::default());
        assert!(!contact.is_reachable());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut website = SourceFinding::scraped(SourceKind::Website);
        website.people.push(person("Mario Rossi", Some("Export Manager"), None));
        website.people.push(person("Sara Galli", Some("Sales"), None));
        let findings = vec![website, registry_with_rep("Anna Bianchi", None)];

        let first = resolve(&findings);
        for _ in 0..10 {
            assert_eq!(resolve(&findings), first);
        }
        assert_eq!(first.name.as_deref(), Some("Mario Rossi"));
    }
}
