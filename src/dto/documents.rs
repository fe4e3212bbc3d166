use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::UploadedDocument;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentUploaded {
    pub file: UploadedDocument,
}
