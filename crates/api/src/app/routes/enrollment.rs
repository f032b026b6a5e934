//! Students and enrollments.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    routing::{get, post},
    Json, Router,
};

use edugest_enrollment::{Enrollment, NewEnrollment, NewStudent, Student, StudentPatch, TransferEnrollment};
use edugest_infra::SchoolService;

use crate::app::dto::{ListParams, PageResponse};
use crate::app::errors::{service_error_to_response as to_response, ApiResult};
use crate::app::routes::common::{
    self, body, cascaded, created, no_content, ok, params, path_id, require,
};
use crate::context::PrincipalContext;

pub fn students() -> Router {
    Router::new()
        .route("/", get(common::list::<Student>).post(create_student))
        .route(
            "/:id",
            get(common::get_one::<Student>)
                .patch(update_student)
                .delete(delete_student),
        )
        .route("/:id/enrollments", get(student_enrollments))
}

pub fn enrollments() -> Router {
    Router::new()
        .route("/", get(common::list::<Enrollment>).post(enroll))
        .route(
            "/:id",
            get(common::get_one::<Enrollment>).delete(delete_enrollment),
        )
        .route("/:id/cancel", post(cancel_enrollment))
        .route("/:id/transfer", post(transfer_enrollment))
        .route("/:id/transfer-out", post(transfer_out))
}

pub async fn create_student(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewStudent>, JsonRejection>,
) -> ApiResult {
    require(&principal, "enrollment.students.write")?;
    created(services.create_student(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_student(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "enrollment.students.write")?;
    let id = path_id::<Student>(&id)?;
    ok(services.update_student(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_student(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "enrollment.students.delete")?;
    let id = path_id::<Student>(&id)?;
    cascaded(services.delete_student(id).await.map_err(to_response)?)
}

pub async fn student_enrollments(
    Extension(services): Extension<SchoolService>,
    Path(id): Path<String>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult {
    let id = path_id::<Student>(&id)?;
    let page = params(query)?.page_request();
    let enrollments = services
        .student_enrollments(id, page)
        .await
        .map_err(to_response)?;
    ok(PageResponse::from(enrollments))
}

pub async fn enroll(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewEnrollment>, JsonRejection>,
) -> ApiResult {
    require(&principal, "enrollment.enrollments.write")?;
    created(services.enroll(body(payload)?).await.map_err(to_response)?)
}

pub async fn cancel_enrollment(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "enrollment.enrollments.write")?;
    let id = path_id::<Enrollment>(&id)?;
    ok(services.cancel_enrollment(id).await.map_err(to_response)?)
}

pub async fn transfer_enrollment(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<TransferEnrollment>, JsonRejection>,
) -> ApiResult {
    require(&principal, "enrollment.enrollments.write")?;
    let id = path_id::<Enrollment>(&id)?;
    ok(services
        .transfer_enrollment(id, body(payload)?)
        .await
        .map_err(to_response)?)
}

pub async fn transfer_out(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "enrollment.enrollments.write")?;
    let id = path_id::<Enrollment>(&id)?;
    ok(services.transfer_out(id).await.map_err(to_response)?)
}

pub async fn delete_enrollment(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "enrollment.enrollments.delete")?;
    let id = path_id::<Enrollment>(&id)?;
    services.delete_enrollment(id).await.map_err(to_response)?;
    no_content()
}
