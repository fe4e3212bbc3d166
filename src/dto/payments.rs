use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CustomerInfo, OrderLine};

/// Doctor context sent along with a checkout (`formData`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    #[serde(default)]
    pub deposit_code: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
}

/// Body of both the payment-intent and the detailed-invoice endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Tax-inclusive total in currency units.
    pub amount: Decimal,
    #[serde(default)]
    pub products: Vec<OrderLine>,
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub form_data: OrderContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreated {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub receipt_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsInput {
    #[serde(default)]
    pub deposit_code: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub has_uploaded_file: bool,
    #[serde(default)]
    pub uploaded_file_name: Option<String>,
}

/// Everything the wizard collected, sent once the payment went through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedForm {
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub order_details: OrderDetailsInput,
    #[serde(default)]
    pub products: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub payment_intent_id: String,
    #[serde(default)]
    pub form_data: CompletedForm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    pub total_amount: Decimal,
    pub products_count: usize,
    pub customer_email: String,
    pub form_saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecorded {
    pub payment_id: String,
    pub receipt_sent: bool,
    pub order_summary: OrderSummary,
}
