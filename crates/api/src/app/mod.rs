//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend selection and the service layer
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: query/response DTOs and pagination
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use edugest_infra::{SchoolService, StoreResult};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> StoreResult<Router> {
    let services = services::build_services(config).await?;
    Ok(router(config.jwt_secret.clone(), services))
}

/// Router over an already-built service layer.
pub fn router(jwt_secret: String, services: SchoolService) -> Router {
    let jwt = Arc::new(edugest_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
