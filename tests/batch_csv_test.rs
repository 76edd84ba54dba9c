use anyhow::Result;
use company_research::adapters::companies;
use company_research::adapters::http::HttpClient;
use company_research::config::toml_config::{BatchConfig, RegistryConfig, ResearchConfig, SearchConfig};
use company_research::core::batch::SUMMARY_FILE;
use company_research::{
    BatchRunner, BatchSettings, LocalStorage, RegistryFetcher, ResearchWorkflow, SearchFetcher,
    WebsiteFetcher, WorkflowSettings,
};
use httpmock::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_batch_from_crm_export() -> Result<()> {
    let server = MockServer::start_async().await;
    let workspace = TempDir::new()?;
    let output = workspace.path().join("reports");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(
                r#"<html><body><h1>Acme Srl</h1>
                   <p>Scrivici: <a href="mailto:info@acme.it">info@acme.it</a></p></body></html>"#,
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/registry/");
            then.status(200).body("<html><body></body></html>");
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(GET).path("/search/");
            then.status(200).body("<html><body></body></html>");
        })
        .await;

    let csv_path = workspace.path().join("companies.csv");
    fs::write(
        &csv_path,
        format!(
            "Unternehmensname,Domainname des Unternehmens,Stadt\n\
             Acme Srl,{},Milano\n\
             ,,Napoli\n\
             Beta Spa,,Roma\n",
            server.base_url()
        ),
    )?;

    let config = ResearchConfig {
        registry: RegistryConfig {
            search_endpoint: server.url("/registry/"),
            ..Default::default()
        },
        search: SearchConfig {
            endpoint: server.url("/search/"),
            ..Default::default()
        },
        batch: BatchConfig {
            delay_seconds: 0.0,
            concurrent_companies: 2,
            ..Default::default()
        },
        ..Default::default()
    };

    let companies = companies::load_companies(&csv_path)?;
    assert_eq!(companies.len(), 3);

    let storage = LocalStorage::new(&output);
    let client = HttpClient::new(&config.http)?;
    let workflow = ResearchWorkflow::new(
        WebsiteFetcher::new(client.clone(), config.website.clone()),
        RegistryFetcher::new(client.clone(), config.registry.clone()),
        SearchFetcher::new(client, config.search.clone()),
        storage.clone(),
        WorkflowSettings::from_config(&config),
    );
    let summary = BatchRunner::new(Arc::new(workflow), storage, BatchSettings::from_config(&config))
        .run(companies)
        .await?;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.with_contact, 1);
    assert_eq!(summary.failed, 1);
    // only the company without a website contact falls through to web search
    assert_eq!(search.hits_async().await, 1);

    assert!(output.join("Acme_Srl.md").exists());
    assert!(output.join("Beta_Spa.md").exists());

    let csv = fs::read_to_string(output.join(SUMMARY_FILE))?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("0,Acme Srl,true,website,,info@acme.it,,"));
    assert!(lines[2].starts_with("1,,false,none,,,,,"));
    assert!(lines[3].starts_with("2,Beta Spa,true,none,,,,"));
    Ok(())
}
