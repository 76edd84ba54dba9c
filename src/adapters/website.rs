use crate::adapters::html::{parse_page, ParsedPage};
use crate::adapters::http::{is_not_found, HttpClient};
use crate::config::toml_config::WebsiteConfig;
use crate::core::extractor::{extract_emails, extract_people, extract_phones, extract_registry_fields};
use crate::domain::model::{CompanyQuery, PageAttempt, PageKind, PhoneCandidate, SourceFinding, SourceKind};
use crate::domain::ports::SourceFetcher;
use crate::utils::error::{ResearchError, Result};
use crate::utils::validation::validate_domain;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use url::Url;

/// Scrapes the company's own site: the homepage, its footer, and a fixed list
/// of contact/about/team/legal sub-paths.
pub struct WebsiteFetcher {
    client: HttpClient,
    config: WebsiteConfig,
}

impl WebsiteFetcher {
    pub fn new(client: HttpClient, config: WebsiteConfig) -> Self {
        Self { client, config }
    }

    fn base_url(domain: &str) -> Result<Url> {
        validate_domain("domain", domain)?;
        let with_scheme = if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{}", domain.trim_end_matches('/'))
        };
        Url::parse(&with_scheme).map_err(|e| ResearchError::InvalidInput {
            message: format!("invalid domain '{}': {}", domain, e),
        })
    }

    fn sub_pages(&self, base: &Url) -> Vec<(PageKind, Url)> {
        let groups = [
            (PageKind::Contact, &self.config.contact_paths),
            (PageKind::About, &self.config.about_paths),
            (PageKind::Team, &self.config.team_paths),
            (PageKind::Legal, &self.config.legal_paths),
        ];

        let mut seen = HashSet::new();
        groups
            .into_iter()
            .flat_map(|(kind, paths)| paths.iter().map(move |path| (kind, path)))
            .filter_map(|(kind, path)| base.join(path).ok().map(|url| (kind, url)))
            .filter(|(_, url)| seen.insert(url.to_string()))
            .take(self.config.max_pages)
            .collect()
    }

    async fn scrape(&self, base: Url) -> SourceFinding {
        let mut attempts = Vec::new();
        let mut parsed: Vec<ParsedPage> = Vec::new();
        let mut last_error: Option<ResearchError> = None;

        let mut targets = vec![(PageKind::Home, base.clone())];
        targets.extend(self.sub_pages(&base));

        let budget = Duration::from_secs(self.config.budget_seconds);
        let deadline = Instant::now() + budget;

        for (kind, url) in targets {
            let fetched = match timeout_at(deadline, self.client.get_text(url.as_str())).await {
                Ok(fetched) => fetched,
                Err(_) => {
                    tracing::warn!("🌐 Website budget of {:?} used up at {}, keeping {} pages", budget, url, parsed.len());
                    attempts.push(PageAttempt {
                        kind,
                        url: url.to_string(),
                        success: false,
                    });
                    last_error = Some(ResearchError::FetchFailed {
                        kind: SourceKind::Website,
                        message: format!("page budget of {}s used up", budget.as_secs()),
                    });
                    break;
                }
            };

            match fetched {
                Ok(html) => {
                    let page = parse_page(&html);
                    if kind == PageKind::Home && !page.footer.is_empty() {
                        attempts.push(PageAttempt {
                            kind: PageKind::Footer,
                            url: url.to_string(),
                            success: true,
                        });
                    }
                    attempts.push(PageAttempt {
                        kind,
                        url: url.to_string(),
                        success: true,
                    });
                    parsed.push(page);
                }
                Err(e) => {
                    tracing::debug!("page {} unavailable: {}", url, e);
                    attempts.push(PageAttempt {
                        kind,
                        url: url.to_string(),
                        success: false,
                    });
                    if !is_not_found(&e) || last_error.is_none() {
                        last_error = Some(e);
                    }
                }
            }
        }

        if parsed.is_empty() {
            return match last_error {
                Some(e) if !is_not_found(&e) => SourceFinding::failed(SourceKind::Website, e.to_string()),
                _ => SourceFinding::not_found(SourceKind::Website),
            }
            .with_pages(attempts);
        }

        let mut finding = combine(&parsed);
        finding.pages = attempts;
        finding
    }
}

/// Folds every fetched page into one finding. Link targets come first since
/// they are the most deliberate contact data on a page.
fn combine(pages: &[ParsedPage]) -> SourceFinding {
    let mut finding = SourceFinding::scraped(SourceKind::Website);

    let footer: Vec<&str> = pages.iter().map(|p| p.footer.as_str()).filter(|f| !f.is_empty()).collect();
    let text: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();
    let all_text = format!("{}\n{}", footer.join("\n"), text.join("\n"));

    let mut emails: Vec<String> = pages
        .iter()
        .flat_map(|p| p.mailto.iter())
        .flat_map(|target| extract_emails(target))
        .collect();
    emails.extend(extract_emails(&all_text));
    let mut seen = HashSet::new();
    emails.retain(|e| seen.insert(e.to_lowercase()));
    finding.emails = emails;

    let mut phones: Vec<PhoneCandidate> = pages
        .iter()
        .flat_map(|p| p.tel.iter())
        .filter_map(|tel| tel_candidate(tel))
        .collect();
    phones.extend(extract_phones(&all_text));
    let mut seen = HashSet::new();
    phones.retain(|p| seen.insert(p.digits.clone()));
    finding.phones = phones;

    let blocks: Vec<_> = pages.iter().flat_map(|p| p.team.iter().cloned()).collect();
    finding.people = extract_people(&blocks);
    finding.fields = extract_registry_fields(&all_text);

    finding
}

fn tel_candidate(tel: &str) -> Option<PhoneCandidate> {
    let display = tel.trim().to_string();
    let digits: String = display.chars().filter(char::is_ascii_digit).collect();
    (digits.len() >= 6).then_some(PhoneCandidate { display, digits })
}

#[async_trait]
impl SourceFetcher for WebsiteFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Website
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceFinding {
        let Some(domain) = query.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
            tracing::info!("🌐 No domain for {}, website skipped", query.name);
            return SourceFinding::failed(SourceKind::Website, "no domain provided");
        };

        let base = match Self::base_url(domain) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("🌐 Unusable domain '{}': {}", domain, e);
                return SourceFinding::failed(SourceKind::Website, e.to_string());
            }
        };

        tracing::info!("🌐 Scraping website {}", base);
        let finding = self.scrape(base).await;
        tracing::info!(
            status = finding.status.as_str(),
            pages = finding.pages_scraped(),
            emails = finding.emails.len(),
            people = finding.people.len(),
            "🌐 Website done"
        );
        finding
    }
}
