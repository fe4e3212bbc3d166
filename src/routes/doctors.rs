use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::doctors::{DoctorLookup, ProductList},
    error::AppResult,
    response::{ApiResponse, ErrorBody},
    services::doctor_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{code}", get(get_doctor))
        .route("/{code}/products", get(list_products))
}

#[utoipa::path(
    get,
    path = "/api/doctors/{code}",
    params(
        ("code" = String, Path, description = "Deposit code, case-insensitive")
    ),
    responses(
        (status = 200, description = "Doctor found", body = ApiResponse<DoctorLookup>),
        (status = 404, description = "Unknown deposit code", body = ErrorBody),
    ),
    tag = "Doctors"
)]
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<DoctorLookup>>> {
    let response = doctor_service::get_doctor(&state, &code).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/doctors/{code}/products",
    params(
        ("code" = String, Path, description = "Deposit code, case-insensitive")
    ),
    responses(
        (status = 200, description = "Products for the code, empty when unknown", body = ApiResponse<ProductList>),
    ),
    tag = "Doctors"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let response = doctor_service::list_products(&state, &code).await?;
    Ok(Json(response))
}
