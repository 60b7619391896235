use std::path::PathBuf;

use secrecy::SecretString;

use crate::config::helpers::optional_env;
use crate::error::ConfigError;

/// Instance registry (libSQL) configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the local libSQL database file (default: ./diaats.db).
    pub path: PathBuf,
    /// Turso cloud URL for remote sync (optional).
    pub libsql_url: Option<String>,
    /// Turso auth token (required when libsql_url is set).
    pub libsql_auth_token: Option<SecretString>,
}

impl DatabaseConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let path = optional_env("DATABASE_PATH")?
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let libsql_url = optional_env("LIBSQL_URL")?;
        let libsql_auth_token = optional_env("LIBSQL_AUTH_TOKEN")?.map(SecretString::from);

        if libsql_url.is_some() && libsql_auth_token.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "LIBSQL_AUTH_TOKEN".to_string(),
                hint: "LIBSQL_AUTH_TOKEN is required when LIBSQL_URL is set".to_string(),
            });
        }

        Ok(Self {
            path,
            libsql_url,
            libsql_auth_token,
        })
    }
}

/// Default database path (./diaats.db).
pub fn default_database_path() -> PathBuf {
    PathBuf::from("diaats.db")
}
