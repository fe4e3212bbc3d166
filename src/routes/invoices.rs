use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::{invoices::InvoiceCreated, payments::CheckoutRequest},
    error::AppResult,
    response::{ApiResponse, ErrorBody},
    services::invoice_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_detailed_invoice))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Invoice finalized", body = ApiResponse<InvoiceCreated>),
        (status = 400, description = "Empty order or rejected by the processor", body = ErrorBody),
    ),
    tag = "Invoices"
)]
pub async fn create_detailed_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<InvoiceCreated>>> {
    let Json(request) = payload?;
    let response = invoice_service::create_detailed_invoice(&state, request).await?;
    Ok(Json(response))
}
