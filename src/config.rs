use crate::error::PipelineError;
use std::{env, time::Duration};
use url::Url;

pub const DEFAULT_LISTING_URL: &str =
    "https://www.mhlw.go.jp/bunya/roudoukijun/anzeneisei11/rousai-hassei/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub const ENDPOINT_VAR: &str = "GAS_APP_URL";
pub const LISTING_VAR: &str = "MHLW_LISTING_URL";
pub const INSECURE_TLS_VAR: &str = "ACCEPT_INVALID_CERTS";
pub const TIMEOUT_VAR: &str = "HTTP_TIMEOUT_SECS";
pub const USER_AGENT_VAR: &str = "HTTP_USER_AGENT";
pub const DRY_RUN_VAR: &str = "DRY_RUN";

/// Everything a run needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub listing_url: Url,
    /// Where the payload is POSTed. Only optional for dry runs.
    pub endpoint: Option<Url>,
    /// Skip TLS certificate validation. On unless `ACCEPT_INVALID_CERTS=0`.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
    pub user_agent: String,
    pub dry_run: bool,
}

fn default_listing_url() -> Url {
    Url::parse(DEFAULT_LISTING_URL).expect("default listing URL should parse")
}

impl Config {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint: Some(endpoint),
            dry_run: false,
            ..Self::dry_run()
        }
    }

    /// Config that never transmits.
    pub fn dry_run() -> Self {
        Self {
            listing_url: default_listing_url(),
            endpoint: None,
            accept_invalid_certs: true,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            dry_run: true,
        }
    }

    pub fn with_listing_url(mut self, url: Url) -> Self {
        self.listing_url = url;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the process environment once.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dry_run = match get(DRY_RUN_VAR) {
            Some(v) => parse_flag(DRY_RUN_VAR, &v)?,
            None => false,
        };

        let endpoint = get(ENDPOINT_VAR)
            .map(|v| parse_url(ENDPOINT_VAR, &v))
            .transpose()?;
        if endpoint.is_none() && !dry_run {
            return Err(PipelineError::Config(format!("{} is not set", ENDPOINT_VAR)));
        }

        let listing_url = match get(LISTING_VAR) {
            Some(v) => parse_url(LISTING_VAR, &v)?,
            None => default_listing_url(),
        };

        let accept_invalid_certs = match get(INSECURE_TLS_VAR) {
            Some(v) => parse_flag(INSECURE_TLS_VAR, &v)?,
            None => true,
        };

        let timeout = match get(TIMEOUT_VAR) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| PipelineError::Config(format!("{}={:?}: {}", TIMEOUT_VAR, v, e)))?,
            None => DEFAULT_TIMEOUT,
        };

        let user_agent = get(USER_AGENT_VAR).unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            listing_url,
            endpoint,
            accept_invalid_certs,
            timeout,
            user_agent,
            dry_run,
        })
    }

    /// The endpoint, or a configuration error when none was given.
    pub fn require_endpoint(&self) -> Result<&Url, PipelineError> {
        self.endpoint
            .as_ref()
            .ok_or_else(|| PipelineError::Config(format!("{} is not set", ENDPOINT_VAR)))
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, PipelineError> {
    Url::parse(value.trim())
        .map_err(|e| PipelineError::Config(format!("{}={:?}: {}", key, value, e)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, PipelineError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PipelineError::Config(format!(
            "{}={:?} is not a boolean",
            key, other
        ))),
    }
}
