//! Instance lifecycle coordination between the runtime and the registry.
//!
//! There is no transaction spanning the two systems, so each failure point
//! has a fixed resolution policy:
//!
//! ```text
//!   create:  find ──▶ create ──▶ start ──▶ inspect ──▶ insert
//!             │         │          │          │          │
//!          exists?    error      error      error      error
//!             ▼         ▼          ▼          ▼          ▼
//!       AlreadyExists  ───────── returned as-is ──  remove workload
//!                                                  (best effort),
//!                                                  return insert error
//!
//!   destroy: find ──▶ remove workload ──▶ delete record
//!             │            │                   │
//!         NotFound    logged, ignored      returned
//! ```
//!
//! The registry record is the source of truth for whether an instance
//! exists. Both policies may leave an orphan workload behind; they never
//! leave a record whose workload was not at least started.
//!
//! Name uniqueness is a check-then-insert across two awaits. Two concurrent
//! `create` calls for the same name can both pass the check; the manager
//! takes no lock, so the registry's own insert semantics decide the outcome.

use std::sync::Arc;

use crate::config::{Plan, RuntimeConfig, RuntimeOptions};
use crate::db::InstanceRegistry;
use crate::error::{InstanceError, RuntimeError};
use crate::instance::{Instance, workload_name};
use crate::runtime::{ContainerRuntime, RuntimeConnector, WorkloadInspection, WorkloadSpec};

/// Outcome of a lifecycle operation with a best-effort cleanup step.
///
/// `cleanup_error` records a failure of the cleanup step (rollback removal
/// on create, workload removal on destroy). It is kept apart from `result`
/// so that it can be observed without ever replacing the primary outcome.
#[derive(Debug)]
#[must_use]
pub struct Settled<T> {
    pub result: Result<T, InstanceError>,
    pub cleanup_error: Option<RuntimeError>,
}

impl<T> Settled<T> {
    fn failed(error: impl Into<InstanceError>) -> Self {
        Self {
            result: Err(error.into()),
            cleanup_error: None,
        }
    }

    /// Drop the cleanup note and keep the primary result.
    pub fn into_result(self) -> Result<T, InstanceError> {
        self.result
    }
}

/// Creates, looks up and destroys named service instances.
pub struct InstanceManager {
    connector: Arc<dyn RuntimeConnector>,
    registry: Arc<dyn InstanceRegistry>,
    runtime_endpoint: String,
    runtime_options: Option<RuntimeOptions>,
}

impl InstanceManager {
    pub fn new(
        config: &RuntimeConfig,
        connector: Arc<dyn RuntimeConnector>,
        registry: Arc<dyn InstanceRegistry>,
    ) -> Self {
        Self {
            connector,
            registry,
            runtime_endpoint: config.endpoint.clone(),
            runtime_options: config.options.clone(),
        }
    }

    /// Create the instance `name` from `plan`.
    pub async fn create(&self, name: &str, plan: &Plan) -> Result<Instance, InstanceError> {
        self.create_settled(name, plan).await.into_result()
    }

    /// Like [`create`](Self::create), also reporting a failed rollback.
    pub async fn create_settled(&self, name: &str, plan: &Plan) -> Settled<Instance> {
        match self.registry.find_by_name(name).await {
            Ok(_) => return Settled::failed(InstanceError::AlreadyExists),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Settled::failed(e),
        }

        let runtime = match self.connector.connect(&self.runtime_endpoint).await {
            Ok(runtime) => runtime,
            Err(e) => return Settled::failed(e),
        };

        let spec = WorkloadSpec {
            name: workload_name(plan, name),
            image: plan.image.clone(),
            args: plan.args.clone(),
        };
        let (workload_id, inspection) = match self.provision(runtime.as_ref(), &spec).await {
            Ok(provisioned) => provisioned,
            Err(e) => {
                tracing::error!("Failed to provision workload '{}': {}", spec.name, e);
                return Settled::failed(e);
            }
        };

        let instance = Instance::provisioned(
            name,
            plan,
            &self.runtime_endpoint,
            workload_id,
            inspection,
        );

        if let Err(e) = self.registry.insert(&instance).await {
            tracing::error!("Failed to store instance '{}': {}", name, e);
            let cleanup_error = runtime.remove_workload(&instance.workload_id).await.err();
            if let Some(ref cleanup) = cleanup_error {
                tracing::warn!(
                    "Failed to roll back workload {} of instance '{}': {}",
                    instance.workload_id,
                    name,
                    cleanup
                );
            }
            return Settled {
                result: Err(e.into()),
                cleanup_error,
            };
        }

        tracing::info!(
            "Created instance '{}' (plan {}, workload {})",
            name,
            plan.name,
            instance.workload_id
        );

        Settled {
            result: Ok(instance),
            cleanup_error: None,
        }
    }

    /// Create, start and inspect the workload.
    async fn provision(
        &self,
        runtime: &dyn ContainerRuntime,
        spec: &WorkloadSpec,
    ) -> Result<(String, WorkloadInspection), RuntimeError> {
        let options = self.runtime_options.as_ref();
        let id = runtime.create_workload(spec, options).await?;
        runtime.start_workload(&id, options).await?;
        let inspection = runtime.inspect_workload(&id).await?;
        Ok((id, inspection))
    }

    /// Destroy the instance `name`.
    pub async fn destroy(&self, name: &str) -> Result<(), InstanceError> {
        self.destroy_settled(name).await.into_result()
    }

    /// Like [`destroy`](Self::destroy), also reporting a failed workload removal.
    pub async fn destroy_settled(&self, name: &str) -> Settled<()> {
        let instance = match self.get(name).await {
            Ok(instance) => instance,
            Err(e) => return Settled::failed(e),
        };

        let cleanup_error = self.remove_workload(&instance).await.err();
        if let Some(ref cleanup) = cleanup_error {
            tracing::warn!(
                "Failed to remove workload {} of instance '{}': {}",
                instance.workload_id,
                name,
                cleanup
            );
        }

        let result = self
            .registry
            .delete_by_name(name)
            .await
            .map_err(InstanceError::from);

        if result.is_ok() {
            tracing::info!("Destroyed instance '{}'", name);
        }

        Settled {
            result,
            cleanup_error,
        }
    }

    /// Remove the workload of `instance` on the endpoint it was created on.
    async fn remove_workload(&self, instance: &Instance) -> Result<(), RuntimeError> {
        let runtime = self.connector.connect(&instance.runtime_endpoint).await?;
        runtime.remove_workload(&instance.workload_id).await
    }

    /// Look up the instance `name`. The runtime is not consulted.
    pub async fn get(&self, name: &str) -> Result<Instance, InstanceError> {
        self.registry.find_by_name(name).await.map_err(|e| {
            if e.is_not_found() {
                InstanceError::NotFound
            } else {
                InstanceError::Registry(e)
            }
        })
    }
}
