use crate::domain::model::SourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{url} responded with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("{kind} fetch failed: {message}")]
    FetchFailed { kind: SourceKind, message: String },

    #[error("{kind} has no record: {message}")]
    NotFound { kind: SourceKind, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Input,
    Configuration,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ResearchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ResearchError::HttpError(_)
            | ResearchError::HttpStatus { .. }
            | ResearchError::FetchFailed { .. }
            | ResearchError::NotFound { .. } => ErrorCategory::Network,
            ResearchError::InvalidInput { .. } | ResearchError::CsvError(_) => ErrorCategory::Input,
            ResearchError::ConfigError { .. }
            | ResearchError::InvalidConfigValueError { .. }
            | ResearchError::MissingConfigError { .. }
            | ResearchError::TomlError(_) => ErrorCategory::Configuration,
            ResearchError::IoError(_) => ErrorCategory::Storage,
            ResearchError::SerializationError(_) => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a single source going dark only degrades the report
            ErrorCategory::Network => match self {
                ResearchError::NotFound { .. } => ErrorSeverity::Low,
                _ => ErrorSeverity::Medium,
            },
            ErrorCategory::Input | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Whether a caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResearchError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ResearchError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity or raise [http] timeout_seconds / retry_attempts"
            }
            ErrorCategory::Input => "Check the company name and the input CSV headers",
            ErrorCategory::Configuration => "Review the TOML configuration file and CLI flags",
            ErrorCategory::Storage => "Make sure the output directory exists and is writable",
            ErrorCategory::Data => "Re-run with --verbose and inspect the offending record",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ResearchError::InvalidInput { message } => format!("Cannot research company: {}", message),
            ResearchError::IoError(e) => format!("Could not write output: {}", e),
            ResearchError::CsvError(e) => format!("Could not read company list: {}", e),
            ResearchError::TomlError(e) => format!("Configuration file is not valid TOML: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_high_severity() {
        let err = ResearchError::InvalidInput {
            message: "company name is empty".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("company name is empty"));
    }

    #[test]
    fn test_not_found_is_low_severity() {
        let err = ResearchError::NotFound {
            kind: SourceKind::Registry,
            message: "no hits".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Registry has no record: no hits");
    }

    #[test]
    fn test_status_retryability() {
        let server_error = ResearchError::HttpStatus {
            url: "https://acme.it".to_string(),
            status: 503,
        };
        let missing = ResearchError::HttpStatus {
            url: "https://acme.it/team".to_string(),
            status: 404,
        };
        assert!(server_error.is_retryable());
        assert!(!missing.is_retryable());
    }
}
