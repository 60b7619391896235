//! Error types for the broker.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the instance registry.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No record with the requested name.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DatabaseError {
    /// Whether this is the registry's "no such record" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by the container runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Could not reach the runtime daemon.
    #[error("Runtime not available at {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("Failed to pull image '{image}': {reason}")]
    ImagePullFailed { image: String, reason: String },

    #[error("Failed to create workload '{name}': {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("Failed to start workload {id}: {reason}")]
    StartFailed { id: String, reason: String },

    #[error("Failed to inspect workload {id}: {reason}")]
    InspectFailed { id: String, reason: String },

    #[error("Failed to remove workload {id}: {reason}")]
    RemoveFailed { id: String, reason: String },

    #[error("No such workload: {id}")]
    WorkloadNotFound { id: String },
}

/// Errors returned by instance lifecycle operations.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("instance already exists")]
    AlreadyExists,

    #[error("instance not found")]
    NotFound,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Registry(#[from] DatabaseError),
}

/// Plan catalog lookup errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan not found")]
    NotFound(String),
}
