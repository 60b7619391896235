//! libSQL schema.

/// Idempotent schema applied at startup.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS instances (
    name TEXT PRIMARY KEY,
    runtime_endpoint TEXT NOT NULL,
    workload_id TEXT NOT NULL,
    exposed_ports TEXT NOT NULL DEFAULT '[]',
    environment TEXT NOT NULL DEFAULT '[]',
    plan TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_instances_workload_id ON instances(workload_id);
"#;
