use crate::{
    dto::doctors::{DoctorLookup, ProductList, PublicConfig},
    error::{AppError, AppResult},
    models::DoctorRecord,
    response::ApiResponse,
    state::AppState,
};

/// Case-insensitive lookup; `None` when the code is not in the directory.
pub async fn lookup_doctor(state: &AppState, code: &str) -> AppResult<Option<DoctorRecord>> {
    let directory = state.directory.load().await?;
    let found = directory.find(code);
    tracing::debug!(code = %code.trim(), found = found.is_some(), "doctor lookup");
    Ok(found)
}

pub async fn get_doctor(state: &AppState, code: &str) -> AppResult<ApiResponse<DoctorLookup>> {
    let record = lookup_doctor(state, code)
        .await?
        .ok_or(AppError::NotFound("Doctor code"))?;
    Ok(ApiResponse::success("Doctor found", DoctorLookup::from(record)))
}

/// Products for a code; an unknown code yields an empty list.
pub async fn list_products(state: &AppState, code: &str) -> AppResult<ApiResponse<ProductList>> {
    let products = lookup_doctor(state, code)
        .await?
        .map(|record| record.products)
        .unwrap_or_default();
    Ok(ApiResponse::success("Products", ProductList { products }))
}

pub fn public_config(state: &AppState) -> ApiResponse<PublicConfig> {
    ApiResponse::success(
        "Config",
        PublicConfig {
            publishable_key: state.config.stripe_publishable_key.clone(),
        },
    )
}
