//! In-memory collaborators for lifecycle and API tests.
//!
//! Provides:
//! - [`FakeRuntime`]: a container runtime that keeps workloads in memory,
//!   records every call, and can be told to fail individual steps
//! - [`MemoryRegistry`]: an instance registry backed by a `HashMap`
//! - [`test_db`]: a libSQL registry in a temporary directory

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::config::RuntimeOptions;
use crate::db::{InstanceRegistry, LibSqlBackend};
use crate::error::{DatabaseError, RuntimeError};
use crate::instance::Instance;
use crate::runtime::{
    ContainerRuntime, PortMapping, Result as RuntimeResult, RuntimeConnector, WorkloadInspection,
    WorkloadSpec,
};

/// Create a libSQL-backed registry in a temporary directory.
///
/// Returns the registry and a `TempDir` guard; the database file is
/// deleted when the guard is dropped.
pub async fn test_db() -> (Arc<dyn InstanceRegistry>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let backend = LibSqlBackend::new_local(&path)
        .await
        .expect("failed to create test LibSqlBackend");
    backend
        .run_migrations()
        .await
        .expect("failed to run migrations");
    (Arc::new(backend) as Arc<dyn InstanceRegistry>, dir)
}

/// A call made against [`FakeRuntime`].
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    Create {
        spec: WorkloadSpec,
        options: Option<RuntimeOptions>,
    },
    Start(String),
    Inspect(String),
    Remove(String),
}

#[derive(Debug, Clone)]
struct FakeWorkload {
    name: String,
    running: bool,
}

#[derive(Default)]
struct FakeState {
    workloads: HashMap<String, FakeWorkload>,
    calls: Vec<RuntimeCall>,
    endpoints: Vec<String>,
    next_id: u64,
    last_created: Option<String>,
}

#[derive(Default)]
struct FailureToggles {
    create: AtomicBool,
    start: AtomicBool,
    inspect: AtomicBool,
    remove: AtomicBool,
}

/// In-memory container runtime.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the manager owns another as its connector.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    state: Arc<Mutex<FakeState>>,
    fail: Arc<FailureToggles>,
    host_ports: Vec<String>,
    environment: Vec<String>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host ports every started workload reports, one per container port.
    pub fn with_ports(mut self, ports: &[&str]) -> Self {
        self.host_ports = ports.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Environment every workload reports.
    pub fn with_env(mut self, env: &[&str]) -> Self {
        self.environment = env.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail.create.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail.start.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_inspect(&self, fail: bool) {
        self.fail.inspect.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail.remove.store(fail, Ordering::Relaxed);
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state().calls.clone()
    }

    /// Endpoints sessions were opened against, in order.
    pub fn endpoints(&self) -> Vec<String> {
        self.state().endpoints.clone()
    }

    /// Number of sessions opened.
    pub fn connections(&self) -> usize {
        self.state().endpoints.len()
    }

    pub fn workload_count(&self) -> usize {
        self.state().workloads.len()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.state().workloads.contains_key(id)
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.state().workloads.get(id).is_some_and(|w| w.running)
    }

    pub fn workload_name(&self, id: &str) -> Option<String> {
        self.state().workloads.get(id).map(|w| w.name.clone())
    }

    pub fn last_created_id(&self) -> Option<String> {
        self.state().last_created.clone()
    }

    /// Drop a workload behind the broker's back.
    pub fn forget(&self, id: &str) {
        self.state().workloads.remove(id);
    }
}

#[async_trait]
impl RuntimeConnector for FakeRuntime {
    async fn connect(&self, endpoint: &str) -> RuntimeResult<Box<dyn ContainerRuntime>> {
        self.state().endpoints.push(endpoint.to_string());
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn create_workload(
        &self,
        spec: &WorkloadSpec,
        options: Option<&RuntimeOptions>,
    ) -> RuntimeResult<String> {
        let mut state = self.state();
        state.calls.push(RuntimeCall::Create {
            spec: spec.clone(),
            options: options.cloned(),
        });
        if self.fail.create.load(Ordering::Relaxed) {
            return Err(RuntimeError::CreateFailed {
                name: spec.name.clone(),
                reason: "injected failure".to_string(),
            });
        }
        if state.workloads.values().any(|w| w.name == spec.name) {
            return Err(RuntimeError::CreateFailed {
                name: spec.name.clone(),
                reason: "name already in use".to_string(),
            });
        }
        state.next_id += 1;
        let id = format!("workload-{:04}", state.next_id);
        state.workloads.insert(
            id.clone(),
            FakeWorkload {
                name: spec.name.clone(),
                running: false,
            },
        );
        state.last_created = Some(id.clone());
        Ok(id)
    }

    async fn start_workload(&self, id: &str, _options: Option<&RuntimeOptions>) -> RuntimeResult<()> {
        let mut state = self.state();
        state.calls.push(RuntimeCall::Start(id.to_string()));
        if self.fail.start.load(Ordering::Relaxed) {
            return Err(RuntimeError::StartFailed {
                id: id.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        match state.workloads.get_mut(id) {
            Some(workload) => {
                workload.running = true;
                Ok(())
            }
            None => Err(RuntimeError::WorkloadNotFound { id: id.to_string() }),
        }
    }

    async fn inspect_workload(&self, id: &str) -> RuntimeResult<WorkloadInspection> {
        let mut state = self.state();
        state.calls.push(RuntimeCall::Inspect(id.to_string()));
        if self.fail.inspect.load(Ordering::Relaxed) {
            return Err(RuntimeError::InspectFailed {
                id: id.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        let workload = state
            .workloads
            .get(id)
            .ok_or_else(|| RuntimeError::WorkloadNotFound { id: id.to_string() })?;
        let ports = if workload.running {
            self.host_ports
                .iter()
                .enumerate()
                .map(|(i, host_port)| PortMapping {
                    container_port: format!("{}/tcp", 11211 + i),
                    host_port: host_port.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };
        Ok(WorkloadInspection {
            ports,
            environment: self.environment.clone(),
        })
    }

    async fn remove_workload(&self, id: &str) -> RuntimeResult<()> {
        let mut state = self.state();
        state.calls.push(RuntimeCall::Remove(id.to_string()));
        if self.fail.remove.load(Ordering::Relaxed) {
            return Err(RuntimeError::RemoveFailed {
                id: id.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        match state.workloads.remove(id) {
            Some(_) => Ok(()),
            None => Err(RuntimeError::WorkloadNotFound { id: id.to_string() }),
        }
    }
}

/// In-memory instance registry.
#[derive(Default)]
pub struct MemoryRegistry {
    records: Mutex<HashMap<String, Instance>>,
    fail_find: AtomicBool,
    fail_insert: AtomicBool,
    fail_delete: AtomicBool,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_find(&self, fail: bool) {
        self.fail_find.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_insert(&self, fail: bool) {
        self.fail_insert.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::Relaxed);
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, Instance>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

fn unavailable() -> DatabaseError {
    DatabaseError::Query("store unavailable".to_string())
}

#[async_trait]
impl InstanceRegistry for MemoryRegistry {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn insert(&self, instance: &Instance) -> Result<(), DatabaseError> {
        if self.fail_insert.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        let mut records = self.records();
        if records.contains_key(&instance.name) {
            return Err(DatabaseError::Query(format!(
                "duplicate instance name: {}",
                instance.name
            )));
        }
        records.insert(instance.name.clone(), instance.clone());
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Instance, DatabaseError> {
        if self.fail_find.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        self.records()
            .get(name)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "instance".to_string(),
                id: name.to_string(),
            })
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), DatabaseError> {
        if self.fail_delete.load(Ordering::Relaxed) {
            return Err(unavailable());
        }
        self.records().remove(name);
        Ok(())
    }
}
