//! Broker API handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use crate::api::ApiState;
use crate::error::InstanceError;

type ApiError = (StatusCode, String);

fn instance_error(e: InstanceError) -> ApiError {
    let status = match e {
        InstanceError::AlreadyExists => StatusCode::CONFLICT,
        InstanceError::NotFound => StatusCode::NOT_FOUND,
        InstanceError::Runtime(_) | InstanceError::Registry(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateInstanceForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plan: String,
}

impl CreateInstanceForm {
    /// Fill fields the body left empty from the query string.
    fn or_query(self, query: CreateInstanceForm) -> Self {
        let pick = |body: String, query: String| if body.is_empty() { query } else { body };
        Self {
            name: pick(self.name, query.name),
            plan: pick(self.plan, query.plan),
        }
    }
}

/// `name` and `plan` come from the form body, falling back to the query
/// string.
pub async fn create_instance_handler(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<CreateInstanceForm>, QueryRejection>,
    form: Result<Form<CreateInstanceForm>, FormRejection>,
) -> Result<StatusCode, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let form = form.map(|Form(f)| f).unwrap_or_default().or_query(query);

    if form.name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "please provide the name of the instance".to_string(),
        ));
    }
    if form.plan.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "please provide the name of the plan".to_string(),
        ));
    }

    let plan = state
        .plans
        .get(&form.plan)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .manager
        .create(&form.name, plan)
        .await
        .map_err(instance_error)?;

    Ok(StatusCode::CREATED)
}

/// Name of the variable carrying an instance's endpoints to bound apps.
pub fn endpoints_env_var(plan_name: &str) -> String {
    format!("DIAATS_{}_INSTANCE", plan_name.to_uppercase())
}

pub async fn bind_app_handler(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let instance = state.manager.get(&name).await.map_err(instance_error)?;

    let endpoints = serde_json::to_string(&instance.endpoints())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut data = HashMap::new();
    data.insert(endpoints_env_var(&instance.plan.name), endpoints);
    Ok(Json(data))
}

/// Unbinding and unit binds have nothing to undo or record.
pub async fn noop_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn instance_status_handler(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.get(&name).await.map_err(instance_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_instance_handler(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.destroy(&name).await.map_err(instance_error)?;
    Ok(StatusCode::OK)
}
