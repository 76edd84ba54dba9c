use crate::adapters::html::{parse_page, search_hits, SearchHit};
use crate::adapters::http::HttpClient;
use crate::config::toml_config::RegistryConfig;
use crate::core::extractor::extract_registry_fields;
use crate::domain::model::{CompanyQuery, RegistryField, SourceFinding, SourceKind};
use crate::domain::ports::SourceFetcher;
use crate::utils::error::{ResearchError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Business-registry lookup through search-engine snippets. Registry pages
/// themselves are usually behind bot protection, so the detail page is only
/// read when enabled.
pub struct RegistryFetcher {
    client: HttpClient,
    config: RegistryConfig,
}

impl RegistryFetcher {
    pub fn new(client: HttpClient, config: RegistryConfig) -> Self {
        Self { client, config }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        tracing::debug!("registry search: {}", query);
        let html = self
            .client
            .get_text_with_query(&self.config.search_endpoint, &[("q", query)])
            .await?;
        let mut hits = search_hits(&html);
        hits.truncate(self.config.max_results);
        Ok(hits)
    }

    async fn lookup(&self, query: &CompanyQuery) -> Result<SourceFinding> {
        let name = query.search_name();
        let primary = self
            .search(&format!("\"{}\" site:{}", name, self.config.registry_site))
            .await?;

        let snippets: Vec<String> = primary.iter().map(SearchHit::text).collect();
        let mut fields = extract_registry_fields(&snippets.join("\n"));

        if self.config.fetch_detail_page {
            if let Some(hit) = primary.iter().find(|h| h.url.contains(&self.config.registry_site)) {
                match self.client.get_text(&hit.url).await {
                    Ok(html) => {
                        // the listing page is authoritative over snippets
                        fields.extend(extract_registry_fields(&parse_page(&html).text));
                    }
                    Err(e) => tracing::debug!("registry detail page {} unavailable: {}", hit.url, e),
                }
            }
        }

        if !fields.contains_key(&RegistryField::VatNumber) && !fields.contains_key(&RegistryField::Pec) {
            let follow_ups = [
                format!("\"{}\" Partita IVA PEC Italia", name),
                format!("\"{}\" capitale sociale costituzione", name),
            ];
            let mut extra = Vec::new();
            for follow_up in &follow_ups {
                match self.search(follow_up).await {
                    Ok(hits) => extra.extend(hits.iter().map(SearchHit::text)),
                    Err(e) => tracing::debug!("follow-up search failed: {}", e),
                }
            }
            fill_missing(&mut fields, extract_registry_fields(&extra.join("\n")));
        }

        if fields.is_empty() {
            return Err(ResearchError::NotFound {
                kind: SourceKind::Registry,
                message: format!("no registry data for '{}'", name),
            });
        }

        let mut finding = SourceFinding::scraped(SourceKind::Registry);
        finding.fields = fields;
        Ok(finding)
    }
}

fn fill_missing(fields: &mut BTreeMap<RegistryField, String>, extra: BTreeMap<RegistryField, String>) {
    for (field, value) in extra {
        fields.entry(field).or_insert(value);
    }
}

#[async_trait]
impl SourceFetcher for RegistryFetcher {
    fn kind(&self) -> SourceKind {
        SourceKind::Registry
    }

    async fn fetch(&self, query: &CompanyQuery) -> SourceFinding {
        tracing::info!("🏛️ Looking up {} in the business registry", query.name);
        match self.lookup(query).await {
            Ok(finding) => {
                tracing::info!(fields = finding.fields.len(), "🏛️ Registry record found");
                finding
            }
            Err(ResearchError::NotFound { message, .. }) => {
                tracing::info!("🏛️ {}", message);
                SourceFinding::not_found(SourceKind::Registry)
            }
            Err(e) => {
                tracing::warn!("🏛️ Registry lookup failed: {}", e);
                SourceFinding::failed(SourceKind::Registry, e.to_string())
            }
        }
    }
}
