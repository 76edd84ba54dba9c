use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ResearchError, Result};
use crate::utils::validation::{
    validate_allowed_values, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

pub const OUTPUT_FORMATS: &[&str] = &["markdown", "json"];

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub http: HttpConfig,
    pub workflow: WorkflowConfig,
    pub website: WebsiteConfig,
    pub registry: RegistryConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            retry_attempts: 1,
            retry_delay_ms: 500,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept_language: "it-IT,it;q=0.9,en;q=0.8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Upper bound for one source, all of its requests included.
    pub fetch_timeout_seconds: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    pub contact_paths: Vec<String>,
    pub about_paths: Vec<String>,
    pub team_paths: Vec<String>,
    pub legal_paths: Vec<String>,
    /// Sub-pages fetched after the homepage.
    pub max_pages: usize,
    /// Time the page loop may take; pages still missing when it runs out are
    /// skipped and what was fetched so far is kept.
    pub budget_seconds: u64,
}

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(|p| p.to_string()).collect()
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            contact_paths: paths(&["/contatti", "/contact", "/contattaci"]),
            about_paths: paths(&["/chi-siamo", "/about", "/about-us", "/azienda", "/company"]),
            team_paths: paths(&["/team", "/staff"]),
            legal_paths: paths(&["/note-legali", "/privacy"]),
            max_pages: 12,
            budget_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub search_endpoint: String,
    pub registry_site: String,
    pub max_results: usize,
    pub fetch_detail_page: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            registry_site: "ufficiocamerale.it".to_string(),
            max_results: 5,
            fetch_detail_page: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// `{name}` is replaced by the company name.
    pub query_template: String,
    pub max_results: usize,
    pub max_emails: usize,
    pub max_phones: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            query_template: "{name} Italy contact email sales manager".to_string(),
            max_results: 10,
            max_emails: 5,
            max_phones: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub formats: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "reports".to_string(),
            formats: vec!["markdown".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub csv_path: String,
    pub delay_seconds: f64,
    pub concurrent_companies: usize,
    pub limit: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            csv_path: "data/companies.csv".to_string(),
            delay_seconds: 2.0,
            concurrent_companies: 1,
            limit: None,
        }
    }
}

impl ResearchConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn wants_json(&self) -> bool {
        self.output.formats.iter().any(|f| f == "json")
    }
}

impl Validate for ResearchConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("http.timeout_seconds", self.http.timeout_seconds as usize, 1)?;
        validate_range("http.retry_attempts", self.http.retry_attempts, 0, 10)?;
        validate_non_empty_string("http.user_agent", &self.http.user_agent)?;
        validate_positive_number(
            "workflow.fetch_timeout_seconds",
            self.workflow.fetch_timeout_seconds as usize,
            1,
        )?;

        validate_range(
            "website.budget_seconds",
            self.website.budget_seconds,
            1,
            self.workflow.fetch_timeout_seconds.max(1),
        )?;

        let all_paths = self
            .website
            .contact_paths
            .iter()
            .chain(&self.website.about_paths)
            .chain(&self.website.team_paths)
            .chain(&self.website.legal_paths);
        for path in all_paths {
            if !path.starts_with('/') {
                return Err(ResearchError::InvalidConfigValueError {
                    field: "website paths".to_string(),
                    value: path.clone(),
                    reason: "Sub-paths must start with '/'".to_string(),
                });
            }
        }

        validate_url("registry.search_endpoint", &self.registry.search_endpoint)?;
        validate_non_empty_string("registry.registry_site", &self.registry.registry_site)?;
        validate_positive_number("registry.max_results", self.registry.max_results, 1)?;

        validate_url("search.endpoint", &self.search.endpoint)?;
        if !self.search.query_template.contains("{name}") {
            return Err(ResearchError::InvalidConfigValueError {
                field: "search.query_template".to_string(),
                value: self.search.query_template.clone(),
                reason: "Template must contain {name}".to_string(),
            });
        }

        validate_path("output.directory", &self.output.directory)?;
        if self.output.formats.is_empty() {
            return Err(ResearchError::MissingConfigError {
                field: "output.formats".to_string(),
            });
        }
        validate_allowed_values("output.formats", &self.output.formats, OUTPUT_FORMATS)?;

        validate_range("batch.delay_seconds", self.batch.delay_seconds, 0.0, 3600.0)?;
        validate_positive_number("batch.concurrent_companies", self.batch.concurrent_companies, 1)?;
        Ok(())
    }
}

impl ConfigProvider for ResearchConfig {
    fn output_dir(&self) -> &str {
        &self.output.directory
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.workflow.fetch_timeout_seconds)
    }

    fn company_delay(&self) -> Duration {
        Duration::from_secs_f64(self.batch.delay_seconds.max(0.0))
    }

    fn concurrent_companies(&self) -> usize {
        self.batch.concurrent_companies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ResearchConfig::from_toml_str("").unwrap();

        assert_eq!(config.output.directory, "reports");
        assert_eq!(config.batch.csv_path, "data/companies.csv");
        assert_eq!(config.company_delay(), Duration::from_secs(2));
        assert_eq!(config.registry.registry_site, "ufficiocamerale.it");
        assert!(config.website.contact_paths.contains(&"/contatti".to_string()));
        assert!(!config.wants_json());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let toml_content = r#"
[http]
timeout_seconds = 5

[output]
directory = "./out"
formats = ["markdown", "json"]

[batch]
delay_seconds = 0.5
concurrent_companies = 3
"#;

        let config = ResearchConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.http.timeout_seconds, 5);
        assert_eq!(config.http.accept_language, "it-IT,it;q=0.9,en;q=0.8");
        assert_eq!(config.output_dir(), "./out");
        assert!(config.wants_json());
        assert_eq!(config.company_delay(), Duration::from_millis(500));
        assert_eq!(config.concurrent_companies(), 3);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RESEARCH_TEST_OUTPUT_DIR", "/tmp/reports");

        let toml_content = r#"
[output]
directory = "${RESEARCH_TEST_OUTPUT_DIR}"

[search]
endpoint = "${RESEARCH_TEST_UNSET_VARIABLE}"
"#;

        let config = ResearchConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output.directory, "/tmp/reports");
        assert_eq!(config.search.endpoint, "${RESEARCH_TEST_UNSET_VARIABLE}");
        assert!(config.validate().is_err());

        std::env::remove_var("RESEARCH_TEST_OUTPUT_DIR");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_format = ResearchConfig::from_toml_str("[output]\nformats = [\"pdf\"]\n").unwrap();
        assert!(matches!(
            bad_format.validate(),
            Err(ResearchError::InvalidConfigValueError { .. })
        ));

        let bad_template =
            ResearchConfig::from_toml_str("[search]\nquery_template = \"contact email\"\n").unwrap();
        assert!(bad_template.validate().is_err());

        let bad_path = ResearchConfig::from_toml_str("[website]\nteam_paths = [\"team\"]\n").unwrap();
        assert!(bad_path.validate().is_err());

        let zero_workers =
            ResearchConfig::from_toml_str("[batch]\nconcurrent_companies = 0\n").unwrap();
        assert!(zero_workers.validate().is_err());

        let budget_over_timeout = ResearchConfig::from_toml_str(
            "[workflow]\nfetch_timeout_seconds = 30\n[website]\nbudget_seconds = 45\n",
        )
        .unwrap();
        assert!(budget_over_timeout.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = ResearchConfig::from_toml_str("[http\ntimeout_seconds = ").unwrap_err();
        assert!(matches!(err, ResearchError::TomlError(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[registry]\nfetch_detail_page = true\nmax_results = 3\n")
            .unwrap();

        let config = ResearchConfig::from_file(temp_file.path()).unwrap();
        assert!(config.registry.fetch_detail_page);
        assert_eq!(config.registry.max_results, 3);
    }
}
