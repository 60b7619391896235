use secrecy::{ExposeSecret, SecretString};

use crate::config::helpers::optional_env;
use crate::error::ConfigError;

/// HTTP API configuration.
#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl ApiConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            username: optional_env("API_USERNAME")?,
            password: optional_env("API_PASSWORD")?.map(SecretString::from),
        })
    }

    /// Credentials to enforce, present only when both username and password are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.expose_secret().is_empty() => {
                Some((user.as_str(), pass.expose_secret()))
            }
            _ => None,
        }
    }
}
