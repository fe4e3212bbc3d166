//! Stripe REST v1 client.
//!
//! Requests are form-encoded with nested keys (`metadata[depositCode]=DV001`)
//! and authenticated with the secret key as a bearer token.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{
    Deserialize,
    de::{DeserializeOwned, IgnoredAny},
};

use super::{
    CreateIntentParams, Customer, CustomerParams, Invoice, InvoiceItemParams, InvoiceParams,
    PaymentIntent, PaymentProcessor, ProcessorError,
};

#[derive(Debug, Clone)]
pub struct StripeClient {
    api_base: String,
    secret_key: String,
    http: Client,
}

type FormFields = Vec<(String, String)>;

impl StripeClient {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            http: Client::new(),
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &FormFields,
    ) -> Result<T, ProcessorError> {
        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(fields)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProcessorError> {
        let response = self
            .http
            .get(format!("{}{path}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        parse_response(response).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ProcessorError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error.message.or(envelope.error.kind))
            .unwrap_or_else(|| format!("payment processor returned status {status}"));
        return Err(ProcessorError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| ProcessorError::UnexpectedResponse(e.to_string()))
}

/// Object ids are interpolated into URL paths.
fn checked_id(id: &str) -> Result<&str, ProcessorError> {
    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ProcessorError::InvalidId(id.to_string()))
    }
}

fn push_metadata(fields: &mut FormFields, metadata: &BTreeMap<String, String>) {
    for (key, value) in metadata {
        fields.push((format!("metadata[{key}]"), value.clone()));
    }
}

fn intent_form(params: &CreateIntentParams) -> FormFields {
    let mut fields = vec![
        ("amount".to_string(), params.amount_minor.to_string()),
        ("currency".to_string(), params.currency.clone()),
        ("description".to_string(), params.description.clone()),
    ];
    if let Some(email) = params.receipt_email.as_ref().filter(|e| !e.is_empty()) {
        fields.push(("receipt_email".to_string(), email.clone()));
    }
    if let Some(descriptor) = &params.statement_descriptor {
        fields.push(("statement_descriptor".to_string(), descriptor.clone()));
    }
    if let Some(suffix) = params.statement_descriptor_suffix.as_ref().filter(|s| !s.is_empty()) {
        fields.push(("statement_descriptor_suffix".to_string(), suffix.clone()));
    }
    push_metadata(&mut fields, &params.metadata);
    fields
}

fn customer_form(params: &CustomerParams) -> FormFields {
    let mut fields = vec![
        ("email".to_string(), params.email.clone()),
        ("name".to_string(), params.name.clone()),
    ];
    if let Some(line1) = params.address_line1.as_ref().filter(|l| !l.is_empty()) {
        fields.push(("address[line1]".to_string(), line1.clone()));
        fields.push(("address[country]".to_string(), params.country.clone()));
    }
    push_metadata(&mut fields, &params.metadata);
    fields
}

fn invoice_form(params: &InvoiceParams) -> FormFields {
    let mut fields = vec![
        ("customer".to_string(), params.customer_id.clone()),
        ("auto_advance".to_string(), "false".to_string()),
        ("collection_method".to_string(), "send_invoice".to_string()),
        ("days_until_due".to_string(), params.days_until_due.to_string()),
        ("description".to_string(), params.description.clone()),
    ];
    push_metadata(&mut fields, &params.metadata);
    fields
}

fn invoice_item_form(params: &InvoiceItemParams) -> FormFields {
    vec![
        ("customer".to_string(), params.customer_id.clone()),
        ("invoice".to_string(), params.invoice_id.clone()),
        ("currency".to_string(), params.currency.clone()),
        ("description".to_string(), params.description.clone()),
        ("unit_amount".to_string(), params.unit_amount_minor.to_string()),
        ("quantity".to_string(), params.quantity.to_string()),
    ]
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        params: CreateIntentParams,
    ) -> Result<PaymentIntent, ProcessorError> {
        self.post_form("/v1/payment_intents", &intent_form(&params))
            .await
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ProcessorError> {
        let id = checked_id(id)?;
        self.get(&format!("/v1/payment_intents/{id}")).await
    }

    async fn create_customer(&self, params: CustomerParams) -> Result<Customer, ProcessorError> {
        self.post_form("/v1/customers", &customer_form(&params)).await
    }

    async fn create_invoice(&self, params: InvoiceParams) -> Result<Invoice, ProcessorError> {
        self.post_form("/v1/invoices", &invoice_form(&params)).await
    }

    async fn add_invoice_item(&self, params: InvoiceItemParams) -> Result<(), ProcessorError> {
        let _: IgnoredAny = self
            .post_form("/v1/invoiceitems", &invoice_item_form(&params))
            .await?;
        Ok(())
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<Invoice, ProcessorError> {
        let id = checked_id(invoice_id)?;
        self.post_form(&format!("/v1/invoices/{id}/finalize"), &Vec::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };

    use super::*;
    use crate::processor::IntentStatus;

    type Captured = Arc<Mutex<Vec<(String, String)>>>;

    async fn create_intent(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Form(fields): Form<Vec<(String, String)>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer sk_test_123");
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": { "message": "Invalid API Key provided" } })),
            );
        }
        captured.lock().unwrap().extend(fields);
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": "pi_123",
                "amount": 5460,
                "currency": "eur",
                "status": "requires_payment_method",
                "client_secret": "pi_123_secret_abc",
                "metadata": { "depositCode": "DV001" }
            })),
        )
    }

    async fn declined() -> (StatusCode, Json<serde_json::Value>) {
        (
            StatusCode::PAYMENT_REQUIRED,
            Json(serde_json::json!({
                "error": { "type": "card_error", "message": "Your card was declined." }
            })),
        )
    }

    async fn spawn_fake_stripe() -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/v1/payment_intents", post(create_intent))
            .route("/v1/payment_intents/{id}", get(declined))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn intent_params() -> CreateIntentParams {
        CreateIntentParams {
            amount_minor: 5460,
            currency: "eur".into(),
            description: "FIDIA - Jane".into(),
            receipt_email: Some("jane@example.com".into()),
            statement_descriptor: Some("FIDIA PHARMA".into()),
            statement_descriptor_suffix: Some("DV001".into()),
            metadata: BTreeMap::from([("depositCode".to_string(), "DV001".to_string())]),
        }
    }

    #[tokio::test]
    async fn creates_intent_with_form_encoded_fields() {
        let (base, captured) = spawn_fake_stripe().await;
        let client = StripeClient::new(format!("{base}/"), "sk_test_123");

        let intent = client.create_payment_intent(intent_params()).await.unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.status, IntentStatus::RequiresPaymentMethod);
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));

        let fields = captured.lock().unwrap().clone();
        assert!(fields.contains(&("amount".into(), "5460".into())));
        assert!(fields.contains(&("currency".into(), "eur".into())));
        assert!(fields.contains(&("receipt_email".into(), "jane@example.com".into())));
        assert!(fields.contains(&("metadata[depositCode]".into(), "DV001".into())));
    }

    #[tokio::test]
    async fn processor_error_message_is_surfaced() {
        let (base, _) = spawn_fake_stripe().await;

        let wrong_key = StripeClient::new(base.clone(), "sk_wrong");
        let err = wrong_key.create_payment_intent(intent_params()).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid API Key provided");

        let client = StripeClient::new(base, "sk_test_123");
        match client.retrieve_payment_intent("pi_123").await.unwrap_err() {
            ProcessorError::Api { status, message } => {
                assert_eq!(status, 402);
                assert_eq!(message, "Your card was declined.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_ids_that_would_escape_the_path() {
        let client = StripeClient::new("http://127.0.0.1:9", "sk_test_123");
        let err = client
            .retrieve_payment_intent("../v1/customers")
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidId(_)));
    }

    #[test]
    fn customer_address_only_sent_when_present() {
        let mut params = CustomerParams {
            email: "jane@example.com".into(),
            name: "Jane".into(),
            address_line1: None,
            country: "FR".into(),
            metadata: BTreeMap::new(),
        };
        assert!(!customer_form(&params).iter().any(|(k, _)| k.starts_with("address")));

        params.address_line1 = Some("1 rue de Paris".into());
        let fields = customer_form(&params);
        assert!(fields.contains(&("address[line1]".into(), "1 rue de Paris".into())));
        assert!(fields.contains(&("address[country]".into(), "FR".into())));
    }
}
