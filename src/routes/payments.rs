use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::{
    dto::payments::{CheckoutRequest, PaymentIntentCreated, PaymentRecorded, RecordPaymentRequest},
    error::AppResult,
    response::{ApiResponse, ErrorBody},
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intent", post(create_payment_intent))
        .route("/success", post(record_payment_success))
}

#[utoipa::path(
    post,
    path = "/api/payments/intent",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Payment intent created", body = ApiResponse<PaymentIntentCreated>),
        (status = 400, description = "Amount below minimum or rejected by the processor", body = ErrorBody),
    ),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<PaymentIntentCreated>>> {
    let Json(request) = payload?;
    let response = payment_service::create_payment_intent(&state, request).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/payments/success",
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and recorded", body = ApiResponse<PaymentRecorded>),
        (status = 400, description = "Payment not confirmed", body = ErrorBody),
    ),
    tag = "Payments"
)]
pub async fn record_payment_success(
    State(state): State<AppState>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<PaymentRecorded>>> {
    let Json(request) = payload?;
    let response = payment_service::record_payment_success(&state, request).await?;
    Ok(Json(response))
}
