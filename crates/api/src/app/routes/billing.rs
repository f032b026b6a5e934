//! Fee items and invoices.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    routing::{get, post},
    Json, Router,
};

use edugest_billing::{FeeItem, FeeItemPatch, Invoice, NewFeeItem, NewInvoice};
use edugest_infra::SchoolService;

use crate::app::dto::CancelInvoiceRequest;
use crate::app::errors::{service_error_to_response as to_response, ApiResult};
use crate::app::routes::common::{self, body, created, no_content, ok, path_id, require};
use crate::context::PrincipalContext;

pub fn fee_items() -> Router {
    Router::new()
        .route("/", get(common::list::<FeeItem>).post(create_fee_item))
        .route(
            "/:id",
            get(common::get_one::<FeeItem>)
                .patch(update_fee_item)
                .delete(delete_fee_item),
        )
}

/// Invoices are immutable once issued: no PATCH, no DELETE.
pub fn invoices() -> Router {
    Router::new()
        .route("/", get(common::list::<Invoice>).post(issue_invoice))
        .route("/:id", get(common::get_one::<Invoice>))
        .route("/:id/cancel", post(cancel_invoice))
}

pub async fn create_fee_item(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewFeeItem>, JsonRejection>,
) -> ApiResult {
    require(&principal, "billing.fee_items.write")?;
    created(services.create_fee_item(body(payload)?).await.map_err(to_response)?)
}

pub async fn update_fee_item(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<FeeItemPatch>, JsonRejection>,
) -> ApiResult {
    require(&principal, "billing.fee_items.write")?;
    let id = path_id::<FeeItem>(&id)?;
    ok(services.update_fee_item(id, body(payload)?).await.map_err(to_response)?)
}

pub async fn delete_fee_item(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require(&principal, "billing.fee_items.delete")?;
    let id = path_id::<FeeItem>(&id)?;
    services.delete_fee_item(id).await.map_err(to_response)?;
    no_content()
}

pub async fn issue_invoice(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewInvoice>, JsonRejection>,
) -> ApiResult {
    require(&principal, "billing.invoices.write")?;
    created(services.issue_invoice(body(payload)?).await.map_err(to_response)?)
}

pub async fn cancel_invoice(
    Extension(services): Extension<SchoolService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<CancelInvoiceRequest>, JsonRejection>,
) -> ApiResult {
    require(&principal, "billing.invoices.write")?;
    let id = path_id::<Invoice>(&id)?;
    let request = body(payload)?;
    ok(services
        .cancel_invoice(id, &request.reason)
        .await
        .map_err(to_response)?)
}
