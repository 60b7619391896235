//! Instance registry.
//!
//! The lifecycle manager persists instance records through the
//! [`InstanceRegistry`] trait. The production backend is libSQL (Turso's
//! SQLite fork), either a local file or an embedded replica synced to Turso.

pub mod libsql;
pub mod libsql_migrations;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::instance::Instance;

pub use self::libsql::LibSqlBackend;

/// Create the registry backend from configuration, run migrations, and
/// return it.
pub async fn connect_from_config(
    config: &crate::config::DatabaseConfig,
) -> Result<Arc<dyn InstanceRegistry>, DatabaseError> {
    use secrecy::ExposeSecret as _;

    // `DatabaseConfig::resolve` rejects a URL without a token.
    let backend = match (&config.libsql_url, &config.libsql_auth_token) {
        (Some(url), Some(token)) => {
            LibSqlBackend::new_remote_replica(&config.path, url, token.expose_secret())
                .await?
        }
        _ => LibSqlBackend::new_local(&config.path).await?,
    };
    backend.run_migrations().await?;
    Ok(Arc::new(backend))
}

/// Durable store of instance records, keyed by instance name.
#[async_trait]
pub trait InstanceRegistry: Send + Sync {
    /// Run schema migrations for this backend.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Persist a new instance record.
    async fn insert(&self, instance: &Instance) -> Result<(), DatabaseError>;

    /// Fetch the record for `name`.
    ///
    /// A missing record is reported as [`DatabaseError::NotFound`].
    async fn find_by_name(&self, name: &str) -> Result<Instance, DatabaseError>;

    /// Delete the record for `name`. Deleting an absent name succeeds.
    async fn delete_by_name(&self, name: &str) -> Result<(), DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    #[tokio::test]
    async fn test_connect_from_config_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("diaats.db"),
            libsql_url: None,
            libsql_auth_token: None,
        };

        let registry = connect_from_config(&config).await.unwrap();
        assert!(config.path.exists());
        let err = registry.find_by_name("mycache").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
