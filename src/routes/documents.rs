use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use utoipa::ToSchema;

use crate::{
    dto::documents::DocumentUploaded,
    error::AppResult,
    response::{ApiResponse, ErrorBody},
    services::document_service,
    state::AppState,
};

/// Multipart body: a single file in the `document` field.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    #[schema(format = Binary, value_type = String)]
    document: Vec<u8>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_document))
}

#[utoipa::path(
    post,
    path = "/api/documents",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = ApiResponse<DocumentUploaded>),
        (status = 400, description = "No file, several files or file too large", body = ErrorBody),
    ),
    tag = "Documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<DocumentUploaded>>> {
    let response = document_service::upload_document(&state, multipart).await?;
    Ok(Json(response))
}
