//! Container runtime capability.
//!
//! The lifecycle manager drives workloads only through the two small traits
//! in this module:
//!
//! - [`RuntimeConnector`] opens a session against a runtime endpoint. Each
//!   lifecycle operation opens its own session and drops it before returning.
//! - [`ContainerRuntime`] creates, starts, inspects and removes a single
//!   workload identified by the opaque ID the runtime hands back.
//!
//! The production implementation talks to Docker via bollard (see
//! [`docker`]); tests use the in-memory fake in `crate::testing`.

pub mod docker;

use async_trait::async_trait;

use crate::config::RuntimeOptions;
use crate::error::RuntimeError;

pub use docker::{DockerConnector, DockerRuntime};

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// What to run for a new workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    /// Runtime-side name of the workload.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Launch command; empty keeps the image default.
    pub args: Vec<String>,
}

/// A container port and the host port the runtime published it on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// Container-side port, e.g. `11211/tcp`.
    pub container_port: String,
    /// Host-side port, e.g. `49153`.
    pub host_port: String,
}

/// State reported by the runtime for a started workload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadInspection {
    /// Published ports, in the order the runtime reported them.
    pub ports: Vec<PortMapping>,
    /// Effective environment as raw `KEY=VALUE` entries.
    pub environment: Vec<String>,
}

impl WorkloadInspection {
    /// Host ports across all container ports, flattened in report order.
    pub fn host_ports(&self) -> Vec<String> {
        self.ports.iter().map(|p| p.host_port.clone()).collect()
    }
}

/// A session against one container runtime endpoint.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create (but do not start) a workload, returning its ID.
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
        options: Option<&RuntimeOptions>,
    ) -> Result<String>;

    /// Start a created workload.
    async fn start_workload(&self, id: &str, options: Option<&RuntimeOptions>) -> Result<()>;

    /// Report published ports and environment of a workload.
    ///
    /// Returns [`RuntimeError::WorkloadNotFound`] when the ID is unknown.
    async fn inspect_workload(&self, id: &str) -> Result<WorkloadInspection>;

    /// Forcibly remove a workload, stopping it first if it is running.
    async fn remove_workload(&self, id: &str) -> Result<()>;
}

/// Opens [`ContainerRuntime`] sessions.
#[async_trait]
pub trait RuntimeConnector: Send + Sync {
    /// Connect to the runtime at `endpoint`, e.g. `tcp://10.0.0.5:2375`.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn ContainerRuntime>>;
}
