use axum::{Json, extract::State};

use crate::{
    dto::doctors::PublicConfig, response::ApiResponse, services::doctor_service, state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Publishable processor key", body = ApiResponse<PublicConfig>),
    ),
    tag = "Config"
)]
pub async fn public_config(State(state): State<AppState>) -> Json<ApiResponse<PublicConfig>> {
    Json(doctor_service::public_config(&state))
}
