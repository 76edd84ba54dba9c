use crate::utils::error::{ResearchError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ResearchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Accepts a bare host (`acme.it`) or a full http(s) URL.
pub fn validate_domain(field_name: &str, domain: &str) -> Result<()> {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        return validate_url(field_name, domain);
    }

    let valid = !domain.is_empty()
        && domain.contains('.')
        && !domain.contains("..")
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: domain.to_string(),
            reason: "Not a valid host name".to_string(),
        });
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_allowed_values(field_name: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed.iter().copied().collect();

    for value in values {
        if !allowed_set.contains(value.as_str()) {
            return Err(ResearchError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: value.clone(),
                reason: format!("Unsupported value. Allowed: {}", allowed.join(", ")),
            });
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ResearchError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("search.endpoint", "https://html.duckduckgo.com/html/").is_ok());
        assert!(validate_url("search.endpoint", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("search.endpoint", "").is_err());
        assert!(validate_url("search.endpoint", "invalid-url").is_err());
        assert!(validate_url("search.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("domain", "acme.it").is_ok());
        assert!(validate_domain("domain", "www.rossi-srl.com").is_ok());
        assert!(validate_domain("domain", "https://acme.it").is_ok());
        assert!(validate_domain("domain", "acme").is_err());
        assert!(validate_domain("domain", "acme..it").is_err());
        assert!(validate_domain("domain", "acme it.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("batch.concurrent_companies", 5, 1).is_ok());
        assert!(validate_positive_number("batch.concurrent_companies", 0, 1).is_err());
    }

    #[test]
    fn test_validate_allowed_values() {
        let formats = vec!["md".to_string(), "json".to_string()];
        assert!(validate_allowed_values("output.formats", &formats, &["md", "json"]).is_ok());

        let invalid = vec!["pdf".to_string()];
        assert!(validate_allowed_values("output.formats", &invalid, &["md", "json"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("batch.delay_seconds", 2.0, 0.0, 600.0).is_ok());
        assert!(validate_range("batch.delay_seconds", -1.0, 0.0, 600.0).is_err());
    }
}
