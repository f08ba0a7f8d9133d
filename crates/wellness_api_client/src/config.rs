use crate::BackendError;
use secrecy::SecretString;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub api_token: Option<SecretString>,
}

impl Config {
    pub fn from_env() -> Result<Self, BackendError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, BackendError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = get("WELLNESS_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::Config(format!(
                "WELLNESS_API_BASE_URL must be an http(s) url, got {base_url}"
            )));
        }
        let api_token = get("WELLNESS_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(|t| SecretString::new(t.into()));
        Ok(Self {
            base_url,
            api_token,
        })
    }
}
