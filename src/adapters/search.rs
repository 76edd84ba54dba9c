use crate::adapters::html::{search_hits, SearchHit};
use crate::adapters::http::HttpClient;
use crate::config::toml_config::SearchConfig;
use crate::core::extractor::{extract_emails, extract_phones, extract_registry_fields};
use crate::domain::model::{CompanyQuery, SourceFinding, SourceKind};
use crate::domain::ports::SourceFetcher;
use crate::utils::error::{ResearchError, Result};
use async_trait::async_trait;

/// General web search, used only when the other sources left no way to
/// reach the company. Reads result snippets, never the result pages.
pub struct SearchFetcher {
    client: HttpClient,
    config: SearchConfig,
}

impl SearchFetcher {
    pub fn new(client: HttpClient, config: SearchConfig) -> Self {
        Self { client, config }
    }

    pub fn query_for(&self, query: &CompanyQuery) -> String {
        self.config.query_template.replace("{name}", &query.search_name())
    }

    async fn search(&self, query: &CompanyQuery) -> Result<SourceFinding> {
        let terms = self.query_for(query);
        tracing::debug!("web search: {}", terms);

        let html = self
            .client
            .get_text_with_query(&self.config.endpoint, &[("q", terms.as_str())])
            .await?;
        let mut hits = search_hits(&html);
        if hits.is_empty() {
            return Err(ResearchError::NotFound {
                kind: SourceKind::Search,
                message: format!("no results for '{}'", terms),
            });
        }
        hits.truncate(self.config.max_results);

        let text = hits.iter().map(SearchHit::text).collect::<Vec<_>>().join("\n");

        let mut finding = SourceFinding::scraped(SourceKind::Search);
        finding.emails = extract_emails(&text);
        finding.emails.truncate(self.config.max_emails);
        finding.phones = extract_phones(&text);
        finding.phones.truncate(self.config.max_phones);
        finding.fields = extract_registry_fields(&text);
        Ok(finding)
    }
}

#[async_trait]
impl SourceFetcher for SearchFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Search
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceFinding {
        tracing::info!("🔎 Searching the web for {}", query.name);
        match self.search(query).await {
            Ok(finding) => {
                tracing::info!(
                    emails = finding.emails.len(),
                    phones = finding.phones.len(),
                    "🔎 Web search done"
                );
                finding
            }
            Err(ResearchError::NotFound { message, .. }) => {
                tracing::info!("🔎 {}", message);
                SourceFinding::not_found(SourceKind::Search)
            }
            Err(e) => {
                tracing::warn!("🔎 Web search failed: {}", e);
                SourceFinding::failed(SourceKind::Search, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::html::results_page;
    use crate::config::toml_config::HttpConfig;
    use crate::domain::model::{FindingStatus, RegistryField};
    use httpmock::prelude::*;

    fn fetcher(server: &MockServer, max_emails: usize) -> SearchFetcher {
        let client = HttpClient::new(&HttpConfig {
            timeout_seconds: 5,
            retry_attempts: 0,
            ..Default::default()
        })
        .unwrap();
        SearchFetcher::new(
            client,
            SearchConfig {
                endpoint: server.url("/html/"),
                max_emails,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_snippets_yield_capped_emails_and_phones() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/html/")
                    .query_param("q", "Acme Srl Italy contact email sales manager");
                then.status(200).body(results_page(&[
                    (
                        "https://acme.it/contatti",
                        "Contatti - Acme Srl",
                        "Scrivi a sales@acme.it o info@acme.it, tel. 02 1234567",
                    ),
                    (
                        "https://example.org/acme",
                        "Acme Srl Milano",
                        "Ufficio: export@acme.it - P.IVA 01234567890",
                    ),
                ]));
            })
            .await;

        let finding = fetcher(&server, 2).fetch(&CompanyQuery::new("Acme Srl")).await;

        search.assert_async().await;
        assert_eq!(finding.status, FindingStatus::Scraped);
        assert_eq!(finding.emails, vec!["sales@acme.it", "info@acme.it"]);
        assert_eq!(finding.phones.len(), 1);
        assert_eq!(finding.phones[0].display, "02 1234567");
        assert_eq!(finding.field(RegistryField::VatNumber), Some("01234567890"));
    }

    #[tokio::test]
    async fn test_no_hits_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/html/");
                then.status(200).body("<html><body>No results.</body></html>");
            })
            .await;

        let finding = fetcher(&server, 5).fetch(&CompanyQuery::new("Ignota Spa")).await;
        assert_eq!(finding.status, FindingStatus::NotFound);
    }

    #[tokio::test]
    async fn test_rate_limited_search_is_failed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/html/");
                then.status(403);
            })
            .await;

        let finding = fetcher(&server, 5).fetch(&CompanyQuery::new("Acme Srl")).await;
        assert_eq!(finding.status, FindingStatus::Failed);
    }

    #[test]
    fn test_query_strips_quotes() {
        let server_less = SearchFetcher::new(
            HttpClient::new(&HttpConfig::default()).unwrap(),
            SearchConfig::default(),
        );
        let query = CompanyQuery::new("L'Officina \"Rossi\"");
        assert_eq!(
            server_less.query_for(&query),
            "LOfficina Rossi Italy contact email sales manager"
        );
    }
}
