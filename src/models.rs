use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pricing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductRecord {
    pub name: String,
    /// Tax-exclusive unit price.
    pub price: Decimal,
}

impl ProductRecord {
    pub fn price_ttc(&self) -> Decimal {
        pricing::ttc_price(self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DoctorRecord {
    pub code: String,
    pub name: String,
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

/// A selected product as it travels between the wizard, the API and the
/// ledgers: `{ name, price, ttc, quantity }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub name: String,
    #[serde(rename = "price")]
    pub unit_price_ht: Decimal,
    #[serde(rename = "ttc", default)]
    pub unit_price_ttc: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl OrderLine {
    pub fn new(product: &ProductRecord, quantity: u32) -> Self {
        Self {
            name: product.name.clone(),
            unit_price_ht: product.price,
            unit_price_ttc: product.price_ttc(),
            quantity,
        }
    }

    pub fn line_total_ht(&self) -> Decimal {
        self.unit_price_ht * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub deposit_code: Option<String>,
    pub doctor_name: Option<String>,
    pub products: Vec<OrderLine>,
    pub order_date: String,
    pub order_time: String,
    pub total_amount: Decimal,
    pub has_uploaded_file: bool,
    pub uploaded_file_name: Option<String>,
}

/// One confirmed payment, appended to `payments.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub payment_intent_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub customer_info: CustomerInfo,
    pub order_details: OrderDetails,
    pub payment_method: Option<String>,
    pub processor_metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedForm {
    pub deposit_code: Option<String>,
    pub doctor_name: Option<String>,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub products: Vec<OrderLine>,
}

/// Form tracking entry, appended to `submissions.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub payment_intent_id: String,
    pub form: SubmittedForm,
    pub document_file: Option<String>,
    pub payment_amount: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub original_name: String,
    pub filename: String,
    pub path: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}
