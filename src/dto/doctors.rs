use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DoctorRecord, ProductRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DoctorLookup {
    pub code: String,
    pub name: String,
    pub products: Vec<ProductRecord>,
}

impl From<DoctorRecord> for DoctorLookup {
    fn from(record: DoctorRecord) -> Self {
        Self {
            code: record.code,
            name: record.name,
            products: record.products,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub publishable_key: String,
}
