//! Payment processor boundary.
//!
//! Card tokenization, 3-D Secure, wallets and receipt e-mails all live on the
//! processor side. This crate only builds requests and reads back statuses.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod stripe;

pub use stripe::StripeClient;

pub const CURRENCY: &str = "eur";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Minor units.
    pub amount: i64,
    pub currency: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Unix seconds.
    #[serde(default)]
    pub created: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIntentParams {
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub receipt_email: Option<String>,
    pub statement_descriptor: Option<String>,
    pub statement_descriptor_suffix: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerParams {
    pub email: String,
    pub name: String,
    pub address_line1: Option<String>,
    pub country: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Customer {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceParams {
    pub customer_id: String,
    pub description: String,
    pub days_until_due: u32,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceItemParams {
    pub customer_id: String,
    pub invoice_id: String,
    pub currency: String,
    pub description: String,
    pub unit_amount_minor: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub hosted_invoice_url: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("payment processor unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor rejected the request; `message` is shown to the user as is.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid processor object id: {0}")]
    InvalidId(String),

    #[error("unexpected payment processor response: {0}")]
    UnexpectedResponse(String),
}

#[automock]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(
        &self,
        params: CreateIntentParams,
    ) -> Result<PaymentIntent, ProcessorError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ProcessorError>;

    async fn create_customer(&self, params: CustomerParams) -> Result<Customer, ProcessorError>;

    async fn create_invoice(&self, params: InvoiceParams) -> Result<Invoice, ProcessorError>;

    async fn add_invoice_item(&self, params: InvoiceItemParams) -> Result<(), ProcessorError>;

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, ProcessorError>;
}
