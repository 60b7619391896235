//! InstanceRegistry implementation for LibSqlBackend.

use async_trait::async_trait;
use libsql::params;

use super::{LibSqlBackend, fmt_ts, get_json, get_text, get_ts};
use crate::db::{InstanceRegistry, libsql_migrations};
use crate::error::DatabaseError;
use crate::instance::Instance;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn row_to_instance(row: &libsql::Row) -> Result<Instance, DatabaseError> {
    Ok(Instance {
        name: get_text(row, 0),
        runtime_endpoint: get_text(row, 1),
        workload_id: get_text(row, 2),
        exposed_ports: get_json(row, 3)?,
        environment: get_json(row, 4)?,
        plan: get_json(row, 5)?,
        created_at: get_ts(row, 6),
    })
}

#[async_trait]
impl InstanceRegistry for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        // WAL mode persists in the database file: all future connections benefit.
        conn.query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("Failed to enable WAL mode: {}", e)))?;
        conn.execute_batch(libsql_migrations::SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(format!("libSQL migration failed: {}", e)))?;
        Ok(())
    }

    async fn insert(&self, instance: &Instance) -> Result<(), DatabaseError> {
        let exposed_ports = to_json(&instance.exposed_ports)?;
        let environment = to_json(&instance.environment)?;
        let plan = to_json(&instance.plan)?;

        let conn = self.connect().await?;
        conn.execute(
            r#"
                INSERT INTO instances (
                    name, runtime_endpoint, workload_id, exposed_ports,
                    environment, plan, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            params![
                instance.name.as_str(),
                instance.runtime_endpoint.as_str(),
                instance.workload_id.as_str(),
                exposed_ports,
                environment,
                plan,
                fmt_ts(&instance.created_at),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Instance, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                r#"
                SELECT name, runtime_endpoint, workload_id, exposed_ports,
                       environment, plan, created_at
                FROM instances WHERE name = ?1
                "#,
                params![name],
            )
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?
        {
            Some(row) => row_to_instance(&row),
            None => Err(DatabaseError::NotFound {
                entity: "instance".to_string(),
                id: name.to_string(),
            }),
        }
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute("DELETE FROM instances WHERE name = ?1", params![name])
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }
}
