//! Docker implementation of the container runtime capability.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::PortBinding;
use futures::StreamExt;

use crate::config::RuntimeOptions;
use crate::error::RuntimeError;
use crate::runtime::{
    ContainerRuntime, PortMapping, Result, RuntimeConnector, WorkloadInspection, WorkloadSpec,
};

/// Seconds bollard waits on a single Docker API request.
const DOCKER_TIMEOUT_SECS: u64 = 120;

/// Opens a bollard client per lifecycle operation.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    auto_pull: bool,
}

impl DockerConnector {
    pub fn new(auto_pull: bool) -> Self {
        Self { auto_pull }
    }
}

#[async_trait]
impl RuntimeConnector for DockerConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn ContainerRuntime>> {
        let docker = connect_docker(endpoint)?;
        Ok(Box::new(DockerRuntime {
            docker,
            auto_pull: self.auto_pull,
        }))
    }
}

/// Connect to the Docker daemon at `endpoint`.
///
/// `unix://` endpoints use the socket connector; anything else (`tcp://`,
/// `http://`) goes over plain HTTP.
pub fn connect_docker(endpoint: &str) -> Result<Docker> {
    let unavailable = |e: BollardError| RuntimeError::Unavailable {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    };

    #[cfg(unix)]
    if let Some(path) = endpoint.strip_prefix("unix://") {
        return Docker::connect_with_unix(path, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            .map_err(unavailable);
    }

    Docker::connect_with_http(endpoint, DOCKER_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        .map_err(unavailable)
}

/// A connected Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
    auto_pull: bool,
}

impl DockerRuntime {
    /// Pull the image unless the daemon already has it.
    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            tracing::debug!("Image '{}' exists locally", image);
            return Ok(());
        }

        tracing::info!("Pulling image: {}", image);

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::trace!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(RuntimeError::ImagePullFailed {
                        image: image.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("Pulled image: {}", image);
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
        options: Option<&RuntimeOptions>,
    ) -> Result<String> {
        if self.auto_pull {
            self.ensure_image(&spec.image).await?;
        }

        let config = Config {
            image: Some(spec.image.clone()),
            cmd: if spec.args.is_empty() {
                None
            } else {
                Some(spec.args.clone())
            },
            host_config: options.cloned(),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(create_options), config)
            .await
            .map_err(|e| RuntimeError::CreateFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        for warning in &response.warnings {
            tracing::warn!("Docker warning creating '{}': {}", spec.name, warning);
        }

        Ok(response.id)
    }

    async fn start_workload(&self, id: &str, _options: Option<&RuntimeOptions>) -> Result<()> {
        // The Engine API no longer accepts a HostConfig at start time; the
        // options were applied when the container was created.
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| match e {
                BollardError::DockerResponseServerError {
                    status_code: 404, ..
                } => RuntimeError::WorkloadNotFound { id: id.to_string() },
                e => RuntimeError::StartFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                },
            })
    }

    async fn inspect_workload(&self, id: &str) -> Result<WorkloadInspection> {
        let info = self
            .docker
            .inspect_container(id, None)
            .await
            .map_err(|e| match e {
                BollardError::DockerResponseServerError {
                    status_code: 404, ..
                } => RuntimeError::WorkloadNotFound { id: id.to_string() },
                e => RuntimeError::InspectFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                },
            })?;

        let ports = info
            .network_settings
            .and_then(|ns| ns.ports)
            .map(port_mappings)
            .unwrap_or_default();
        let environment = info.config.and_then(|c| c.env).unwrap_or_default();

        Ok(WorkloadInspection { ports, environment })
    }

    async fn remove_workload(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| match e {
                BollardError::DockerResponseServerError {
                    status_code: 404, ..
                } => RuntimeError::WorkloadNotFound { id: id.to_string() },
                e => RuntimeError::RemoveFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                },
            })
    }
}

/// Flatten Docker's port map into mappings ordered by container port.
///
/// Docker reports ports as an unordered map; sorting by port number keeps
/// the stored endpoint order stable for a given image.
fn port_mappings(ports: HashMap<String, Option<Vec<PortBinding>>>) -> Vec<PortMapping> {
    let mut entries: Vec<_> = ports.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| port_sort_key(a).cmp(&port_sort_key(b)));

    entries
        .into_iter()
        .flat_map(|(container_port, bindings)| {
            bindings
                .unwrap_or_default()
                .into_iter()
                .filter_map(move |binding| {
                    binding.host_port.map(|host_port| PortMapping {
                        container_port: container_port.clone(),
                        host_port,
                    })
                })
        })
        .collect()
}

fn port_sort_key(key: &str) -> (u32, &str) {
    let (port, proto) = key.split_once('/').unwrap_or((key, ""));
    (port.parse().unwrap_or(u32::MAX), proto)
}
