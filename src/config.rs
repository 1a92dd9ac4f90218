use anyhow::{bail, Context, Result};

pub const ENV_API_URL: &str = "PORTAL_API_URL";
pub const ENV_HTTP_TIMEOUT: &str = "PORTAL_HTTP_TIMEOUT_SECS";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Base URL of the record store; collections live under `{api_url}/tables/`.
    pub api_url: String,
    pub http_timeout_secs: u64,
}

impl PortalConfig {
    /// Reads the process environment after `.env` has been loaded.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup(ENV_API_URL)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .with_context(|| format!("{ENV_API_URL} must point at the portal record store"))?;

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            bail!("{ENV_API_URL} must be an http(s) URL, got {api_url:?}");
        }

        let http_timeout_secs = match lookup(ENV_HTTP_TIMEOUT) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_HTTP_TIMEOUT} must be a whole number of seconds"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            http_timeout_secs,
        })
    }
}
