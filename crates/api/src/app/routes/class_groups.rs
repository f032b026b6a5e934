//! Class groups and the curriculum grid.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    routing::get,
    Json, Router,
};

use edugest_academics::{
    ClassGroup, ClassGroupPatch, CurriculumEntry, CurriculumEntryPatch, NewClassGroup,
    NewCurriculumEntry,
};
use edugest_infra::SchoolService;

use crate::app::dto::{ListParams, PageResponse};
use crate::app::errors::{service_error_to_response as to_response, ApiResult};
use crate::app::routes::common::{
    self, body, cascaded, created, no_content, ok, params, path_id, require,
};
use crate::context::PrincipalContext;

pub fn class_groups() -> Router {
    Router::new()
        .route("/", get(common::list::<ClassGroup>).post(create_class_group))
        .route(
            "/:id",
            get(common::get_one::<ClassGroup>)
                .patch(update_class_group)
                .delete(delete_class_group),
        )
        .route("/:id/students", get(class_group_students))
}

pub fn curriculum() -> Router {
    Router::new()
        .route(
            "/",
            get(common::list::<CurriculumEntry>).post(create_curriculum_entry),
        )
        .route(
            "/:id",
            get(common::get_one::<CurriculumEntry>)
                .patch(update_curriculum_entry)
                .delete(delete_curriculum_entry),
        )
}

pub async fn create_class_group(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewClassGroup>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.class_groups.write")?;
    created(
        services
            .create_class_group(body(payload)?)
            .await
            .map_err(to_response)?,
    )
}

pub async fn update_class_group(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<ClassGroupPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.class_groups.write")?;
    let id = path_id::<ClassGroup>(&id)?;
    ok(services
        .update_class_group(id, body(payload)?)
        .await
        .map_err(to_response)?)
}

pub async fn delete_class_group(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.class_groups.delete")?;
    let id = path_id::<ClassGroup>(&id)?;
    cascaded(services.delete_class_group(id).await.map_err(to_response)?)
}

pub async fn class_group_students(
    Extension(services): Extension<SchoolService>,
    Path(id): Path<String>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let id = path_id::<ClassGroup>(&id)?;
    let page = params(query)?.page_request();
    let students = services
        .class_group_students(id, page)
        .await
        .map_err(to_response)?;
    ok(PageResponse::from(students))
}

pub async fn create_curriculum_entry(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewCurriculumEntry>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.curriculum.write")?;
    created(
        services
            .create_curriculum_entry(body(payload)?)
            .await
            .map_err(to_response)?,
    )
}

pub async fn update_curriculum_entry(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<CurriculumEntryPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.curriculum.write")?;
    let id = path_id::<CurriculumEntry>(&id)?;
    ok(services
        .update_curriculum_entry(id, body(payload)?)
        .await
        .map_err(to_response)?)
}

pub async fn delete_curriculum_entry(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.curriculum.delete")?;
    let id = path_id::<CurriculumEntry>(&id)?;
    services
        .delete_curriculum_entry(id)
        .await
        .map_err(to_response)?;
    no_content()
}
