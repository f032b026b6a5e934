//! School years, courses, classes, subjects, rooms and periods.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    routing::{get, post},
    Json, Router,
};

use edugest_academics::{
    ClassLevel, ClassLevelPatch, Course, CoursePatch, NewClassLevel, NewCourse, NewPeriod,
    NewRoom, NewSchoolYear, NewSubject, Period, PeriodPatch, Room, RoomPatch, SchoolYear,
    SchoolYearPatch, Subject, SubjectPatch,
};
use edugest_infra::SchoolService;

use crate::app::errors::{service_error_to_response as to_response, ApiResult};
use crate::app::routes::common::{self, body, cascaded, created, no_content, ok, path_id, require};
use crate::context::PrincipalContext;

pub fn school_years() -> Router {
    Router::new()
        .route(
            "/",
            get(common::list::<SchoolYear>).post(create_school_year),
        )
        .route("/current", get(current_school_year))
        .route(
            "/:id",
            get(common::get_one::<SchoolYear>)
                .patch(update_school_year)
                .delete(delete_school_year),
        )
        .route("/:id/activate", post(activate_school_year))
}

pub fn courses() -> Router {
    Router::new()
        .route("/", get(common::list::<Course>).post(create_course))
        .route(
            "/:id",
            get(common::get_one::<Course>)
                .patch(update_course)
                .delete(delete_course),
        )
}

pub fn class_levels() -> Router {
    Router::new()
        .route("/", get(common::list::<ClassLevel>).post(create_class_level))
        .route(
            "/:id",
            get(common::get_one::<ClassLevel>)
                .patch(update_class_level)
                .delete(delete_class_level),
        )
}

pub fn subjects() -> Router {
    Router::new()
        .route("/", get(common::list::<Subject>).post(create_subject))
        .route(
            "/:id",
            get(common::get_one::<Subject>)
                .patch(update_subject)
                .delete(delete_subject),
        )
}

pub fn rooms() -> Router {
    Router::new()
        .route("/", get(common::list::<Room>).post(create_room))
        .route(
            "/:id",
            get(common::get_one::<Room>)
                .patch(update_room)
                .delete(delete_room),
        )
}

pub fn periods() -> Router {
    Router::new()
        .route("/", get(common::list::<Period>).post(create_period))
        .route(
            "/:id",
            get(common::get_one::<Period>)
                .patch(update_period)
                .delete(delete_period),
        )
}

// -------------------------
// School years
// -------------------------

pub async fn create_school_year(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewSchoolYear>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.school_years.write")?;
    let year = services
        .create_school_year(body(payload)?)
        .await
        .map_err(to_response)?;
    created(year)
}

pub async fn current_school_year(Extension(services): Extension<SchoolService>) -> ApiResult {
    ok(services.current_school_year().await.map_err(to_response)?)
}

pub async fn update_school_year(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SchoolYearPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.school_years.write")?;
    let id = path_id::<SchoolYear>(&id)?;
    let year = services
        .update_school_year(id, body(payload)?)
        .await
        .map_err(to_response)?;
    ok(year)
}

pub async fn activate_school_year(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.school_years.write")?;
    let id = path_id::<SchoolYear>(&id)?;
    ok(services.activate_school_year(id).await.map_err(to_response)?)
}

pub async fn delete_school_year(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.school_years.delete")?;
    let id = path_id::<SchoolYear>(&id)?;
    cascaded(services.delete_school_year(id).await.map_err(to_response)?)
}

// -------------------------
// Courses
// -------------------------

pub async fn create_course(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.courses.write")?;
    created(services.create_course(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_course(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<CoursePatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.courses.write")?;
    let id = path_id::<Course>(&id)?;
    ok(services.update_course(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_course(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.courses.delete")?;
    let id = path_id::<Course>(&id)?;
    cascaded(services.delete_course(id).await.map_err(to_response)?)
}

// -------------------------
// Classes (levels)
// -------------------------

pub async fn create_class_level(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewClassLevel>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.classes.write")?;
    created(
        services
            .create_class_level(body(payload)?)
            .await
            .map_err(to_response)?,
    )
}

pub async fn update_class_level(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<ClassLevelPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.classes.write")?;
    let id = path_id::<ClassLevel>(&id)?;
    ok(services
        .update_class_level(id, body(payload)?)
        .await
        .map_err(to_response)?)
}

pub async fn delete_class_level(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.classes.delete")?;
    let id = path_id::<ClassLevel>(&id)?;
    cascaded(services.delete_class_level(id).await.map_err(to_response)?)
}

// -------------------------
// Subjects
// -------------------------

pub async fn create_subject(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewSubject>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.subjects.write")?;
    created(services.create_subject(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_subject(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SubjectPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.subjects.write")?;
    let id = path_id::<Subject>(&id)?;
    ok(services.update_subject(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_subject(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.subjects.delete")?;
    let id = path_id::<Subject>(&id)?;
    services.delete_subject(id).await.map_err(to_response)?;
    no_content()
}

// -------------------------
// Rooms / periods
// -------------------------

pub async fn create_room(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewRoom>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.rooms.write")?;
    created(services.create_room(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_room(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<RoomPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.rooms.write")?;
    let id = path_id::<Room>(&id)?;
    ok(services.update_room(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_room(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.rooms.delete")?;
    let id = path_id::<Room>(&id)?;
    services.delete_room(id).await.map_err(to_response)?;
    no_content()
}

pub async fn create_period(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewPeriod>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.periods.write")?;
    created(services.create_period(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_period(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<PeriodPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "academics.periods.write")?;
    let id = path_id::<Period>(&id)?;
    ok(services.update_period(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_period(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "academics.periods.delete")?;
    let id = path_id::<Period>(&id)?;
    services.delete_period(id).await.map_err(to_response)?;
    no_content()
}
