use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCreated {
    pub invoice_id: String,
    pub invoice_url: Option<String>,
    pub payment_intent_id: Option<String>,
}
