//! Generic handlers and extractor helpers shared by the route modules.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use edugest_auth::Permission;
use edugest_infra::{CascadeSummary, Record, Repository, SchoolService, SchoolStore};

use crate::app::dto::{self, ListParams, Listed, PageResponse};
use crate::app::errors::{self, ApiResult};
use crate::context::PrincipalContext;

/// Fail with 403 unless the principal holds `permission`.
pub fn require(principal: &PrincipalContext, permission: &'static str) -> Result<(), Response> {
    crate::authz::authorize_request(principal, &Permission::new(permission))
        .map_err(errors::forbidden)
}

/// Parse a path id for `T`.
pub fn path_id<T: Record>(raw: &str) -> Result<T::Id, Response> {
    dto::parse_uuid(&format!("{} id", T::KIND), raw).map(T::Id::from)
}

pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(v)| v).map_err(errors::json_rejection)
}

pub fn params(query: Result<Query<ListParams>, QueryRejection>) -> Result<ListParams, Response> {
    query.map(|Query(v)| v).map_err(errors::query_rejection)
}

pub fn ok<T: Serialize>(value: T) -> ApiResult {
    Ok((StatusCode::OK, Json(value)).into_response())
}

pub fn created<T: Serialize>(value: T) -> ApiResult {
    Ok((StatusCode::CREATED, Json(value)).into_response())
}

pub fn no_content() -> ApiResult {
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub fn cascaded(summary: CascadeSummary) -> ApiResult {
    ok(serde_json::json!({
        "message": summary.message(),
        "entity": summary.entity,
        "id": summary.id,
        "deleted": summary.deleted,
    }))
}

pub async fn get_one<T>(
    Extension(services): Extension<SchoolService>,
    Path(id): Path<String>,
) -> ApiResult
where
    T: Listed,
    dyn SchoolStore: Repository<T>,
{
    let id = path_id::<T>(&id)?;
    let record = services
        .get::<T>(id)
        .await
        .map_err(errors::service_error_to_response)?;
    ok(record)
}

pub async fn list<T>(
    Extension(services): Extension<SchoolService>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult
where
    T: Listed,
    dyn SchoolStore: Repository<T>,
{
    let query = params(query)?.into_query::<T>()?;
    let page = services
        .list::<T>(query)
        .await
        .map_err(errors::service_error_to_response)?;
    ok(PageResponse::from(page))
}
