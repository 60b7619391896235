//! diaats: a service broker that provisions backing services as Docker
//! containers.
//!
//! The broker exposes create/status/bind/destroy operations over HTTP. Each
//! instance is a container created from a configured plan and a record in
//! a libSQL registry; [`instance::InstanceManager`] keeps the two in step.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod instance;
pub mod runtime;

#[cfg(test)]
pub mod testing;
