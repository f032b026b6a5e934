//! Teachers and teaching assignments.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    routing::get,
    Json, Router,
};

use edugest_infra::SchoolService;
use edugest_staff::{NewTeacher, NewTeachingAssignment, Teacher, TeacherPatch, TeachingAssignment};

use crate::app::dto::{ListParams, PageResponse};
use crate::app::errors::{service_error_to_response as to_response, ApiResult};
use crate::app::routes::common::{
    self, body, cascaded, created, no_content, ok, params, path_id, require,
};
use crate::context::PrincipalContext;

pub fn teachers() -> Router {
    Router::new()
        .route("/", get(common::list::<Teacher>).post(create_teacher))
        .route(
            "/:id",
            get(common::get_one::<Teacher>)
                .patch(update_teacher)
                .delete(delete_teacher),
        )
        .route("/:id/assignments", get(teacher_assignments))
}

pub fn assignments() -> Router {
    Router::new()
        .route(
            "/",
            get(common::list::<TeachingAssignment>).post(create_assignment),
        )
        .route(
            "/:id",
            get(common::get_one::<TeachingAssignment>).delete(delete_assignment),
        )
}

pub async fn create_teacher(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewTeacher>, JsonRejection>,
) -> ApiResult {
    require(&principal, "staff.teachers.write")?;
    created(services.create_teacher(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_teacher(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<TeacherPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "staff.teachers.write")?;
    let id = path_id::<Teacher>(&id)?;
    ok(services.update_teacher(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_teacher(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "staff.teachers.delete")?;
    let id = path_id::<Teacher>(&id)?;
    cascaded(services.delete_teacher(id).await.map_err(to_response)?)
}

pub async fn teacher_assignments(
    Extension(services): Extension<SchoolService>,
    Path(id): Path<String>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let id = path_id::<Teacher>(&id)?;
    let page = params(query)?.page_request();
    let assignments = services
        .teacher_assignments(id, page)
        .await
        .map_err(to_response)?;
    ok(PageResponse::from(assignments))
}

pub async fn create_assignment(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewTeachingAssignment>, JsonRejection>,
) -> ApiResult {
    require(&principal, "staff.assignments.write")?;
    created(services.assign_teacher(body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_assignment(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "staff.assignments.delete")?;
    let id = path_id::<TeachingAssignment>(&id)?;
    services.delete_assignment(id).await.map_err(to_response)?;
    no_content()
}
