use crate::config::helpers::{optional_env, parse_optional_env, required_env};
use crate::error::ConfigError;

/// Container runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Runtime daemon endpoint, e.g. `tcp://192.168.50.4:2375`.
    pub endpoint: String,
    /// Options applied to every workload; `None` leaves runtime defaults.
    pub options: Option<RuntimeOptions>,
    /// Pull the plan image when it is missing on the daemon. Off unless
    /// `DOCKER_AUTO_PULL` is set.
    pub auto_pull: bool,
}

/// Global workload options: a Docker HostConfig, applied unmodified to
/// every workload.
pub type RuntimeOptions = bollard::models::HostConfig;

/// Parse `DOCKER_CONFIG` (HostConfig JSON with PascalCase keys).
pub fn parse_runtime_options(raw: &str) -> Result<RuntimeOptions, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::InvalidValue {
        key: "DOCKER_CONFIG".to_string(),
        message: e.to_string(),
    })
}

impl RuntimeConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let endpoint = required_env(
            "DOCKER_HOST",
            "Set DOCKER_HOST to the Docker daemon address, e.g. tcp://127.0.0.1:2375",
        )?;
        let options = optional_env("DOCKER_CONFIG")?
            .map(|raw| parse_runtime_options(&raw))
            .transpose()?;
        Ok(Self {
            endpoint,
            options,
            auto_pull: parse_optional_env("DOCKER_AUTO_PULL", false)?,
        })
    }
}
