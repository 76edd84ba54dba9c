use clap::Parser;
use company_research::adapters::companies;
use company_research::adapters::http::HttpClient;
use company_research::domain::ports::ConfigProvider;
use company_research::utils::error::ErrorSeverity;
use company_research::utils::monitor::ResourceMonitor;
use company_research::utils::{logger, validation::Validate};
use company_research::{
    BatchRunner, BatchSettings, BatchSummary, CliArgs, CompanyQuery, LocalStorage, RegistryFetcher,
    ResearchConfig, ResearchError, ResearchWorkflow, RunState, SearchFetcher, WebsiteFetcher,
    WorkflowSettings,
};
use std::sync::Arc;

type Workflow = ResearchWorkflow<WebsiteFetcher, RegistryFetcher, SearchFetcher, LocalStorage>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting company-research");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = match args.load_config().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let monitor = ResourceMonitor::new(args.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 Resource monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_dir());
    let workflow = match build_workflow(&config, storage.clone()) {
        Ok(workflow) => workflow,
        Err(e) => exit_with(&e),
    };

    if args.is_batch() {
        run_batch(&config, workflow, storage, monitor).await
    } else {
        let name = args.company_name.clone().unwrap_or_default();
        run_single(&config, &workflow, &name, args.domain.as_deref()).await;
        monitor.log_final_stats();
        Ok(())
    }
}

fn build_workflow(config: &ResearchConfig, storage: LocalStorage) -> Result<Workflow, ResearchError> {
    let client = HttpClient::new(&config.http)?;

    Ok(ResearchWorkflow::new(
        WebsiteFetcher::new(client.clone(), config.website.clone()),
        RegistryFetcher::new(client.clone(), config.registry.clone()),
        SearchFetcher::new(client, config.search.clone()),
        storage,
        WorkflowSettings::from_config(config),
    ))
}

async fn run_single(config: &ResearchConfig, workflow: &Workflow, name: &str, domain: Option<&str>) {
    let mut query = match companies::find_company(&config.batch.csv_path, name) {
        Ok(Some(found)) => {
            println!("Found in CSV: {}", found.name);
            found
        }
        Ok(None) => {
            println!("Company not found in CSV, using provided name: {}", name);
            CompanyQuery::new(name)
        }
        Err(e) => {
            tracing::warn!("Could not read {}: {}", config.batch.csv_path, e);
            CompanyQuery::new(name)
        }
    };
    if let Some(domain) = domain {
        query = query.with_domain(domain);
    }
    if query.domain.is_none() {
        println!("Warning: No domain provided. Website scraping will be skipped.");
    }

    println!("\nResearching: {}", query.name);
    println!("Domain: {}", query.domain.as_deref().unwrap_or("N/A"));
    println!("{}", "-".repeat(40));

    match workflow.run(query).await {
        Ok(state) => print_result(&state),
        Err(e) => exit_with(&e),
    }
}

async fn run_batch(
    config: &ResearchConfig,
    workflow: Workflow,
    storage: LocalStorage,
    monitor: ResourceMonitor,
) -> anyhow::Result<()> {
    let mut list = match companies::load_companies(&config.batch.csv_path) {
        Ok(list) => list,
        Err(e) => exit_with(&e),
    };
    if let Some(limit) = config.batch.limit {
        list.truncate(limit);
    }

    println!("Processing {} companies from {}", list.len(), config.batch.csv_path);
    println!("{}", "=".repeat(60));

    let runner = BatchRunner::new(Arc::new(workflow), storage, BatchSettings::from_config(config))
        .with_monitor(monitor);

    match runner.run(list).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => exit_with(&e),
    }
}

fn print_result(state: &RunState) {
    println!("\n{}", "=".repeat(40));
    println!("RESEARCH COMPLETE");
    println!("{}", "=".repeat(40));

    let contact = &state.contact;
    if contact.is_reachable() || contact.name.is_some() {
        println!("\nContact found ({}):", contact.source);
        println!("  Name:  {}", contact.name.as_deref().unwrap_or("N/A"));
        println!("  Role:  {}", contact.role.as_deref().unwrap_or("N/A"));
        println!("  Email: {}", contact.email.as_deref().unwrap_or("N/A"));
        println!("  Phone: {}", contact.phone.as_deref().unwrap_or("N/A"));
    } else {
        println!("\nNo contact found.");
    }

    if let Some(path) = &state.report_path {
        println!("\n📁 Report saved to: {}", path);
    }
}

fn print_summary(summary: &BatchSummary) {
    for outcome in &summary.outcomes {
        let status = if !outcome.succeeded {
            "FAILED".to_string()
        } else if let Some(reach) = outcome.email.as_ref().or(outcome.phone.as_ref()) {
            format!("contact: {}", reach)
        } else {
            "no contact found".to_string()
        };
        println!("[{}] {} - {}", outcome.index + 1, outcome.company, status);
    }

    println!("\n{}", "=".repeat(60));
    println!("BATCH COMPLETE");
    println!("{}", "=".repeat(60));
    println!("Total:        {}", summary.total);
    println!("Successful:   {}", summary.successful);
    println!("With contact: {}", summary.with_contact);
    println!("Failed:       {}", summary.failed);
}

fn exit_with(e: &ResearchError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
