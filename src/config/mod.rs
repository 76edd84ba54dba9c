pub mod toml_config;

pub use toml_config::ResearchConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::ResearchConfig;
    use crate::utils::error::Result;
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "company-research")]
    #[command(about = "Research Italian companies and write a sales contact report for each")]
    pub struct CliArgs {
        /// Company to research; omit it to run over the whole CSV
        pub company_name: Option<String>,

        /// Company web domain, e.g. acme.it
        #[arg(long)]
        pub domain: Option<String>,

        #[arg(long, help = "Process every company in the CSV")]
        pub batch: bool,

        #[arg(long, help = "Process at most this many companies in batch mode")]
        pub limit: Option<usize>,

        #[arg(long, help = "Seconds between company starts in batch mode [default: 2.0]")]
        pub delay: Option<f64>,

        #[arg(long, help = "Company list [default: data/companies.csv]")]
        pub csv: Option<String>,

        #[arg(long, help = "TOML configuration file")]
        pub config: Option<PathBuf>,

        #[arg(long, help = "Directory reports are written to [default: reports]")]
        pub output_dir: Option<String>,

        #[arg(long, help = "Companies researched at the same time in batch mode")]
        pub concurrency: Option<usize>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log as JSON lines")]
        pub json_logs: bool,

        #[arg(long, help = "Log process CPU and memory usage")]
        pub monitor: bool,
    }

    impl CliArgs {
        pub fn is_batch(&self) -> bool {
            self.batch
                || self
                    .company_name
                    .as_deref()
                    .map_or(true, |name| name.trim().is_empty())
        }

        /// File configuration (or defaults) with command-line flags on top.
        pub fn load_config(&self) -> Result<ResearchConfig> {
            let mut config = match &self.config {
                Some(path) => ResearchConfig::from_file(path)?,
                None => ResearchConfig::default(),
            };
            self.apply_overrides(&mut config);
            Ok(config)
        }

        pub fn apply_overrides(&self, config: &mut ResearchConfig) {
            if let Some(delay) = self.delay {
                config.batch.delay_seconds = delay;
            }
            if let Some(csv) = &self.csv {
                config.batch.csv_path = csv.clone();
            }
            if let Some(limit) = self.limit {
                config.batch.limit = Some(limit);
            }
            if let Some(concurrency) = self.concurrency {
                config.batch.concurrent_companies = concurrency;
            }
            if let Some(dir) = &self.output_dir {
                config.output.directory = dir.clone();
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::ports::ConfigProvider;
        use std::time::Duration;

        #[test]
        fn test_single_company_mode() {
            let args = CliArgs::try_parse_from(["company-research", "Acme Srl", "--domain", "acme.it"]).unwrap();
            assert!(!args.is_batch());
            assert_eq!(args.company_name.as_deref(), Some("Acme Srl"));
            assert_eq!(args.domain.as_deref(), Some("acme.it"));
        }

        #[test]
        fn test_no_name_means_batch() {
            let args = CliArgs::try_parse_from(["company-research"]).unwrap();
            assert!(args.is_batch());

            let args = CliArgs::try_parse_from(["company-research", "Acme Srl", "--batch"]).unwrap();
            assert!(args.is_batch());
        }

        #[test]
        fn test_flags_override_config() {
            let args = CliArgs::try_parse_from([
                "company-research",
                "--batch",
                "--limit",
                "3",
                "--delay",
                "0.25",
                "--csv",
                "input.csv",
                "--output-dir",
                "out",
                "--concurrency",
                "4",
            ])
            .unwrap();

            let config = args.load_config().unwrap();
            assert_eq!(config.batch.limit, Some(3));
            assert_eq!(config.company_delay(), Duration::from_millis(250));
            assert_eq!(config.batch.csv_path, "input.csv");
            assert_eq!(config.output_dir(), "out");
            assert_eq!(config.concurrent_companies(), 4);
        }

        #[test]
        fn test_defaults_without_flags() {
            let config = CliArgs::try_parse_from(["company-research"])
                .unwrap()
                .load_config()
                .unwrap();
            assert_eq!(config.company_delay(), Duration::from_secs(2));
            assert_eq!(config.batch.csv_path, "data/companies.csv");
        }
    }
}

#[cfg(feature = "cli")]
pub use cli_args::CliArgs;
