//! Provisioned service instances.
//!
//! An [`Instance`] is the durable record of one backing service: which plan
//! it was created from, which workload runs it, and the network state the
//! runtime reported when it started. [`InstanceManager`] owns the lifecycle.

pub mod manager;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Plan;
use crate::runtime::WorkloadInspection;

pub use manager::{InstanceManager, Settled};

/// Prefix shared by every workload the broker creates.
pub const WORKLOAD_PREFIX: &str = "diaats";

/// Runtime-side name of the workload for `name` on `plan`.
pub fn workload_name(plan: &Plan, name: &str) -> String {
    format!("{}-{}-{}", WORKLOAD_PREFIX, plan.name, name)
}

/// A provisioned backing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique, caller-chosen name.
    pub name: String,
    /// Runtime endpoint the workload was created on.
    pub runtime_endpoint: String,
    /// Runtime identifier of the workload.
    pub workload_id: String,
    /// Host ports published for the workload, in report order.
    pub exposed_ports: Vec<String>,
    /// Raw `KEY=VALUE` environment captured at inspection time.
    pub environment: Vec<String>,
    /// Copy of the plan the instance was created from.
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
}

impl Instance {
    /// Build the record for a workload that has been started and inspected.
    pub fn provisioned(
        name: &str,
        plan: &Plan,
        runtime_endpoint: &str,
        workload_id: String,
        inspection: WorkloadInspection,
    ) -> Self {
        Self {
            name: name.to_string(),
            runtime_endpoint: runtime_endpoint.to_string(),
            workload_id,
            exposed_ports: inspection.host_ports(),
            environment: inspection.environment,
            plan: plan.clone(),
            created_at: Utc::now(),
        }
    }

    /// Addresses clients use to reach the instance, one `host:port` per
    /// exposed port.
    ///
    /// The host comes from the runtime endpoint; its own port is the
    /// daemon's and is dropped. An unparseable endpoint yields no addresses.
    pub fn endpoints(&self) -> Vec<String> {
        let host = match Url::parse(&self.runtime_endpoint) {
            Ok(url) => url
                .host_str()
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            Err(e) => {
                tracing::error!(
                    "Failed to parse runtime endpoint {:?} of instance '{}': {}",
                    self.runtime_endpoint,
                    self.name,
                    e
                );
                return Vec::new();
            }
        };
        let Some(host) = host else {
            tracing::error!(
                "Runtime endpoint {:?} of instance '{}' has no host",
                self.runtime_endpoint,
                self.name
            );
            return Vec::new();
        };

        self.exposed_ports
            .iter()
            .map(|port| format!("{}:{}", host, port))
            .collect()
    }

    /// Environment as a map. Entries without `=` are skipped; for repeated
    /// keys the last entry wins.
    pub fn env_map(&self) -> HashMap<String, String> {
        self.environment
            .iter()
            .filter_map(|entry| entry.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
