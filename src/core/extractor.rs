//! Text heuristics for contact and registry data.
//!
//! Everything here is pure: callers hand in text that was already pulled out
//! of HTML or search snippets, and get back zero or more candidates. A text
//! without matches yields an empty result, never an error.

use crate::domain::model::{PersonRecord, PhoneCandidate, RegistryField};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.-]+@(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,}\b").expect("email pattern")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\+39[ .\-]?[0-9]{2,}(?:[ .\-][0-9]{2,}){0,4}\b",
        r"|",
        r"\b0[0-9]{1,4}[ .\-]?[0-9]{2,}(?:[ .\-][0-9]{2,}){0,3}\b",
    ))
    .expect("phone pattern")
});

static DATE_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[./\-][0-9]{2}[./\-][0-9]{2,4}$").expect("date pattern")
});

static TIME_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-2]?[0-9][.:][0-5][0-9](?:\s*[-–]\s*[0-2]?[0-9][.:][0-5][0-9])?$").expect("time pattern")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[89][0-9]{2}|20[0-9]{2})\b").expect("year pattern"));

static CAP_CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{5}\s+(\p{Lu}[\p{L}']+)").expect("city pattern"));

const PLACEHOLDER_DOMAINS: &[&str] = &["example.com", "domain.com", "email.com", "sentry.io"];
const MAX_PHONE_DIGITS: usize = 13;
const NAME_STOPWORDS: &[&str] = &[
    "PEC", "IVA", "CF", "SEDE", "VIA", "TEL", "EMAIL", "DATA", "CODICE", "CAPITALE", "STATO", "SRL", "SPA",
];
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

const SALES_KEYWORDS: &[&str] = &[
    "sales",
    "commercial",
    "vendit",
    "export",
    "business development",
    "key account",
    "account manager",
];

const ROLE_KEYWORDS: &[&str] = &[
    "manager",
    "director",
    "direttore",
    "responsabile",
    "head",
    "ceo",
    "cfo",
    "coo",
    "cto",
    "founder",
    "fondatore",
    "titolare",
    "amministratore",
    "presidente",
    "socio",
    "partner",
    "ufficio",
    "marketing",
    "sales",
    "commerciale",
    "vendite",
    "export",
    "acquisti",
];

/// Labelled registry patterns. The label is matched case-insensitively, the
/// value keeps its own casing rules; the first capture group is the value.
/// Names may be Titlecase or uppercase (`ROSSI MARIO`), two to four words.
static REGISTRY_PATTERNS: LazyLock<Vec<(RegistryField, Regex)>> = LazyLock::new(|| {
    let patterns: [(RegistryField, &str); 8] = [
        (
            RegistryField::VatNumber,
            r"\b(?i:partita\s*iva|p\.?\s*iva|vat(?:\s*number)?)[\s:.°n]*(?:IT)?([0-9]{11})\b",
        ),
        (
            RegistryField::Pec,
            r"\b(?i:pec|posta\s+elettronica\s+certificata)[\s:]+([\w.%+-]+@(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,})\b",
        ),
        (
            RegistryField::AtecoCode,
            r"\b(?i:codice\s+ateco|ateco)[\s:]+([0-9]{2}(?:\.[0-9]{1,2}){0,2})",
        ),
        (
            RegistryField::LegalRepresentative,
            r"\b(?i:rappresentante\s+legale|legale\s+rappresentante|amministratore\s+unico|amministrator[ei]|titolare)[\s:]+(\p{Lu}[\p{L}'’]+(?:[ \t]+\p{Lu}[\p{L}'’]+){1,3})",
        ),
        (
            RegistryField::FoundedDate,
            r"\b(?i:data\s+(?:di\s+)?costituzione|costituzione|costituit[ao](?:\s+(?:il|nel))?|fondat[ao]\s+nel|founded(?:\s+in)?)[\s:]+([0-9]{2}/[0-9]{2}/[0-9]{4}|[0-9]{4})\b",
        ),
        (
            RegistryField::ShareCapital,
            r"\b(?i:capitale\s+sociale)[\s:]+(?:€\s*)?([0-9][0-9.,]*(?:\s*(?:EUR|€|(?i:euro)))?)",
        ),
        (
            RegistryField::ActivityStatus,
            r"\b(?i:stato\s+attivit[àa]|stato\s+impresa|stato)[\s:]+((?i:attiv[ao]|cessat[ao]|inattiv[ao]|in\s+liquidazione|liquidazione|sospes[ao]|fallit[ao]))\b",
        ),
        (
            RegistryField::Address,
            r"\b(?i:sede\s+legale|indirizzo|sede)[\s:]+((?i:via|viale|piazza|piazzale|corso|largo|strada|vicolo|contrada|localit[àa])\s[^\n]{2,80}?\b[0-9]{5}\s+\p{Lu}[\p{L}']+)",
        ),
    ];

    patterns
        .into_iter()
        .map(|(field, pattern)| (field, Regex::new(pattern).expect("registry pattern")))
        .collect()
});

/// Department an address most likely reaches, judged from its local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Sales,
    Management,
    General,
    Other,
    Support,
}

/// A label (usually a heading) and the text found next to it, as isolated by
/// the HTML layer from a team listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub label: String,
    pub text: String,
}

impl TextBlock {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    EMAIL_RE
        .find_iter(text)
        .map(|m| trim_sentence_tail(m.as_str()))
        .filter(|candidate| is_plausible_email(candidate))
        .filter(|candidate| seen.insert(candidate.to_string()))
        .map(str::to_string)
        .collect()
}

/// `info@acme.it.Grazie` is an address followed by a sentence with no space
/// after the dot: drop trailing Titlecase labels.
fn trim_sentence_tail(candidate: &str) -> &str {
    let mut end = candidate.len();
    while let Some(dot) = candidate[..end].rfind('.') {
        let label = &candidate[dot + 1..end];
        let titlecase = label.chars().next().is_some_and(char::is_uppercase)
            && label.chars().skip(1).any(char::is_lowercase);
        let domain_labels = candidate[..dot].split_once('@').map_or(0, |(_, d)| d.split('.').count());
        if !titlecase || domain_labels < 2 {
            break;
        }
        end = dot;
    }
    &candidate[..end]
}

fn is_plausible_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.starts_with('.') || local.ends_with('.') {
        return false;
    }
    if candidate.contains("..") || domain.split('.').any(|label| label.is_empty() || label.starts_with('-')) {
        return false;
    }

    let lowered = domain.to_lowercase();
    !PLACEHOLDER_DOMAINS.iter().any(|d| lowered.ends_with(d))
        && !ASSET_SUFFIXES.iter().any(|s| lowered.ends_with(s))
}

pub fn extract_phones(text: &str) -> Vec<PhoneCandidate> {
    let mut seen = HashSet::new();
    let mut phones = Vec::new();

    for m in PHONE_RE.find_iter(text) {
        let display = m.as_str().trim().to_string();
        let digits: String = display.chars().filter(char::is_ascii_digit).collect();

        if digits.len() < 6
            || digits.len() > MAX_PHONE_DIGITS
            || DATE_LIKE_RE.is_match(&display)
            || TIME_LIKE_RE.is_match(&display)
        {
            continue;
        }
        // an unbroken 11-digit run starting with 0 is a VAT number, not a line
        if digits.len() == 11 && display == digits {
            continue;
        }
        if seen.insert(digits.clone()) {
            phones.push(PhoneCandidate { display, digits });
        }
    }

    phones
}

pub fn extract_people(blocks: &[TextBlock]) -> Vec<PersonRecord> {
    let mut seen = HashSet::new();
    let mut people = Vec::new();

    for block in blocks {
        let name = collapse_whitespace(&block.label);
        if !looks_like_person_name(&name) || !seen.insert(name.clone()) {
            continue;
        }

        let email = extract_emails(&block.text).into_iter().next();
        let phone = extract_phones(&block.text).into_iter().next().map(|p| p.display);
        let role = role_from_text(&block.text, email.as_deref(), phone.as_deref());

        people.push(PersonRecord {
            name,
            role,
            email,
            phone,
        });
    }

    people
}

fn looks_like_person_name(label: &str) -> bool {
    let words: Vec<&str> = label.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) || label.chars().count() > 60 {
        return false;
    }
    words.iter().all(|word| {
        word.chars().next().is_some_and(char::is_uppercase)
            && word
                .chars()
                .all(|c| c.is_alphabetic() || matches!(c, '\'' | '-' | '.'))
    })
}

fn role_from_text(text: &str, email: Option<&str>, phone: Option<&str>) -> Option<String> {
    let mut cleaned = text.to_string();
    for found in [email, phone].into_iter().flatten() {
        cleaned = cleaned.replace(found, " ");
    }

    let segments: Vec<String> = cleaned
        .split(['\n', '|', '•', ','])
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
        .collect();

    let keyed = segments.iter().find(|segment| {
        let lowered = segment.to_lowercase();
        ROLE_KEYWORDS.iter().any(|k| lowered.contains(k))
    });
    if let Some(segment) = keyed {
        return Some(segment.clone());
    }

    segments
        .into_iter()
        .next()
        .filter(|s| s.chars().count() <= 60 && !s.chars().any(|c| c.is_ascii_digit()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn extract_registry_fields(text: &str) -> BTreeMap<RegistryField, String> {
    let mut fields = BTreeMap::new();

    for (field, pattern) in REGISTRY_PATTERNS.iter() {
        if let Some(value) = pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| collapse_whitespace(m.as_str()))
        {
            let value = if *field == RegistryField::LegalRepresentative {
                match strip_trailing_labels(&value) {
                    Some(name) => name,
                    None => continue,
                }
            } else {
                value
            };
            fields.insert(*field, value);
        }
    }

    if let Some(city) = fields
        .get(&RegistryField::Address)
        .and_then(|address| CAP_CITY_RE.captures(address))
        .and_then(|caps| caps.get(1))
    {
        fields.insert(RegistryField::City, city.as_str().to_string());
    }

    fields
}

// "Anna Bianchi PEC: ..." also satisfies the uppercase-name shape
fn strip_trailing_labels(name: &str) -> Option<String> {
    let mut words: Vec<&str> = name.split_whitespace().collect();
    while words
        .last()
        .is_some_and(|w| NAME_STOPWORDS.contains(&w.to_uppercase().as_str()))
    {
        words.pop();
    }
    (words.len() >= 2).then(|| words.join(" "))
}

pub fn is_sales_role(role: &str) -> bool {
    let lowered = role.to_lowercase();
    SALES_KEYWORDS.iter().any(|k| lowered.contains(k))
}

pub fn classify_email(email: &str) -> EmailKind {
    let local = email.split('@').next().unwrap_or_default().to_lowercase();
    let has = |keys: &[&str]| keys.iter().any(|k| local.contains(k));

    if has(&["sales", "vendite", "commercial", "export"]) {
        EmailKind::Sales
    } else if has(&["admin", "direzione", "management", "amministrazione"]) {
        EmailKind::Management
    } else if has(&["info", "contatti", "contact", "hello"]) {
        EmailKind::General
    } else if has(&["support", "assistenza", "help", "noreply", "no-reply"]) {
        EmailKind::Support
    } else {
        EmailKind::Other
    }
}

/// Best address to reach someone commercial: sales, then management, then
/// general mailboxes, personal ones, and support last. Ties keep input order.
pub fn preferred_email(emails: &[String]) -> Option<&str> {
    const ORDER: [EmailKind; 5] = [
        EmailKind::Sales,
        EmailKind::Management,
        EmailKind::General,
        EmailKind::Other,
        EmailKind::Support,
    ];

    ORDER.iter().find_map(|kind| {
        emails
            .iter()
            .find(|email| classify_email(email) == *kind)
            .map(String::as_str)
    })
}

/// Four-digit year out of a founding date such as `12/03/1998` or `1998`.
pub fn founded_year(raw: &str) -> Option<String> {
    YEAR_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
