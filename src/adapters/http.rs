use crate::config::toml_config::HttpConfig;
use crate::utils::error::{ResearchError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Shared GET client for every source. Network errors and 5xx answers are
/// retried with a fixed delay; 4xx answers are returned at once.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
            ResearchError::InvalidConfigValueError {
                field: "http.accept_language".to_string(),
                value: config.accept_language.clone(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with_query(url, &[]).await
    }

    pub async fn get_text_with_query(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_get(url, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt <= self.retry_attempts => {
                    tracing::debug!("GET {} failed (attempt {}): {}, retrying", url, attempt, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("GET {} -> {}", url, status);

        if status.is_success() {
            return Ok(response.text().await?);
        }
        Err(ResearchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

pub fn is_not_found(error: &ResearchError) -> bool {
    matches!(
        error,
        ResearchError::HttpStatus { status, .. }
            if *status == StatusCode::NOT_FOUND.as_u16() || *status == StatusCode::GONE.as_u16()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(retry_attempts: u32) -> HttpClient {
        HttpClient::new(&HttpConfig {
            timeout_seconds: 5,
            retry_attempts,
            retry_delay_ms: 10,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_text_success() {
        let server = MockServer::start_async().await;
        let page = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header_exists("user-agent");
                then.status(200).body("<html>ciao</html>");
            })
            .await;

        let body = client(0).get_text(&server.url("/")).await.unwrap();

        page.assert_async().await;
        assert_eq!(body, "<html>ciao</html>");
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start_async().await;
        let failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/flaky");
                then.status(503);
            })
            .await;

        let err = client(2).get_text(&server.url("/flaky")).await.unwrap_err();

        assert_eq!(failing.hits_async().await, 3);
        assert!(matches!(err, ResearchError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start_async().await;
        let missing = server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;

        let err = client(3).get_text(&server.url("/missing")).await.unwrap_err();

        assert_eq!(missing.hits_async().await, 1);
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_query_parameters_are_encoded() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/html/")
                    .query_param("q", "\"Acme Srl\" site:ufficiocamerale.it");
                then.status(200).body("ok");
            })
            .await;

        let body = client(0)
            .get_text_with_query(
                &server.url("/html/"),
                &[("q", "\"Acme Srl\" site:ufficiocamerale.it")],
            )
            .await
            .unwrap();

        search.assert_async().await;
        assert_eq!(body, "ok");
    }
}
