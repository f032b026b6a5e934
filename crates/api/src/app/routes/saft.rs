use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;

use edugest_infra::SchoolService;

use crate::app::dto::SaftExportParams;
use crate::app::errors::{self, service_error_to_response as to_response, ApiResult};
use crate::app::routes::common::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/export", get(export))
}

/// `GET /saft/export?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
pub async fn export(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<SaftExportParams>, QueryRejection>,
) -> ApiResult {
    require(&principal, "saft.export")?;
    let Query(params) = query.map_err(errors::query_rejection)?;
    let start = parse_date("start_date", params.start_date.as_deref())?;
    let end = parse_date("end_date", params.end_date.as_deref())?;

    let export = services
        .export_saft(start, end)
        .await
        .map_err(to_response)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.file_name),
            ),
        ],
        export.xml,
    )
        .into_response())
}

fn parse_date(name: &'static str, raw: Option<&str>) -> Result<NaiveDate, Response> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{name} is required"),
        )
    })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("{name} must be a date (YYYY-MM-DD)"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_required_and_iso_formatted() {
        assert_eq!(
            parse_date("start_date", Some("2025-01-31")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert_eq!(
            parse_date("start_date", None).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(parse_date("end_date", Some("31/01/2025")).is_err());
    }
}
