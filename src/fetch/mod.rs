// src/fetch/mod.rs

use crate::config::Config;
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub mod urls;

/// Client options derived from a `Config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl HttpSettings {
    /// For the ministry listing page and report downloads; honours `ACCEPT_INVALID_CERTS`.
    pub fn for_listing(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }

    /// For the payload POST; certificates are always verified.
    pub fn for_endpoint(config: &Config) -> Self {
        Self {
            accept_invalid_certs: false,
            ..Self::for_listing(config)
        }
    }

    pub fn build(&self) -> Result<Client> {
        if self.accept_invalid_certs {
            warn!("TLS certificate validation is disabled (set ACCEPT_INVALID_CERTS=0 to enable)");
        }
        Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .context("building HTTP client")
    }
}

/// Client for the ministry site.
pub fn build_client(config: &Config) -> Result<Client> {
    HttpSettings::for_listing(config).build()
}

/// Client for the spreadsheet endpoint.
pub fn build_endpoint_client(config: &Config) -> Result<Client> {
    HttpSettings::for_endpoint(config).build()
}

/// GET `url` and return the body as text.
pub async fn get_text(client: &Client, url: &Url) -> Result<String> {
    debug!("Fetching text from {}", url);
    client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading text from {}", url))
}

/// Download `url` into memory.
pub async fn download_bytes(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("Reading body from {}", url))?;
    debug!(%url, size = bytes.len(), "downloaded");
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_client(&Config::dry_run()).unwrap()
    }

    #[test]
    fn endpoint_client_always_verifies_certificates() {
        let config = Config::dry_run().with_accept_invalid_certs(true);
        assert!(HttpSettings::for_listing(&config).accept_invalid_certs);

        let endpoint = HttpSettings::for_endpoint(&config);
        assert!(!endpoint.accept_invalid_certs);
        assert_eq!(endpoint.user_agent, config.user_agent);
        assert_eq!(endpoint.timeout, config.timeout);

        let strict = Config::dry_run().with_accept_invalid_certs(false);
        assert!(!HttpSettings::for_listing(&strict).accept_invalid_certs);
    }

    #[tokio::test]
    async fn download_sends_user_agent_and_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/24-8.xlsx"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/files/24-8.xlsx", server.uri())).unwrap();
        let bytes = download_bytes(&client(), &url).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.xlsx", server.uri())).unwrap();
        assert!(download_bytes(&client(), &url).await.is_err());
        assert!(get_text(&client(), &url).await.is_err());
    }
}
