//! HTTP API consumed by the platform layer.
//!
//! Routes mirror the service-broker contract:
//!
//! | Method   | Path                          | Action                 |
//! |----------|-------------------------------|------------------------|
//! | `POST`   | `/resources`                  | create an instance     |
//! | `DELETE` | `/resources/{name}`           | destroy an instance    |
//! | `GET`    | `/resources/{name}/status`    | 204 when it exists     |
//! | `POST`   | `/resources/{name}/bind-app`  | endpoints for an app   |
//! | `DELETE` | `/resources/{name}/bind-app`  | no-op                  |
//! | `POST`   | `/resources/{name}/bind`      | no-op                  |
//! | `DELETE` | `/resources/{name}/bind`      | no-op                  |

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::config::PlanCatalog;
use crate::instance::InstanceManager;

pub use auth::AuthState;

/// State shared by all handlers.
pub struct ApiState {
    pub manager: InstanceManager,
    pub plans: PlanCatalog,
}

/// Build the broker router.
pub fn router(state: Arc<ApiState>, auth: AuthState) -> Router {
    Router::new()
        .route("/resources", post(handlers::create_instance_handler))
        .route(
            "/resources/{name}",
            delete(handlers::remove_instance_handler),
        )
        .route(
            "/resources/{name}/status",
            get(handlers::instance_status_handler),
        )
        .route(
            "/resources/{name}/bind-app",
            post(handlers::bind_app_handler).delete(handlers::noop_handler),
        )
        .route(
            "/resources/{name}/bind",
            post(handlers::noop_handler).delete(handlers::noop_handler),
        )
        .layer(middleware::from_fn_with_state(
            auth,
            auth::basic_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
