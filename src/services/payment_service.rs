use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;

use crate::{
    dto::payments::{
        CheckoutRequest, OrderSummary, PaymentIntentCreated, PaymentRecorded,
        RecordPaymentRequest,
    },
    error::{AppError, AppResult},
    models::{OrderDetails, PaymentRecord, SubmissionRecord, SubmittedForm},
    pricing::{MIN_CHARGE_MINOR, from_minor_units, round2, to_minor_units},
    processor::{CURRENCY, CreateIntentParams, IntentStatus, ProcessorError},
    response::ApiResponse,
    state::AppState,
};

/// Processor limit on the intent description, which is what the receipt
/// e-mail shows.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Processor limit on a metadata value is 500; keep a margin.
pub const METADATA_VALUE_MAX_CHARS: usize = 490;

const STATEMENT_SUFFIX_MAX_CHARS: usize = 10;

pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round2(amount))
}

struct ReceiptParties<'a> {
    customer: &'a str,
    doctor: &'a str,
    code: &'a str,
}

impl<'a> ReceiptParties<'a> {
    fn from_request(request: &'a CheckoutRequest) -> Self {
        Self {
            customer: non_empty(Some(request.customer_info.full_name.as_str())).unwrap_or("Client"),
            doctor: non_empty(request.form_data.doctor_name.as_deref())
                .unwrap_or("Unspecified doctor"),
            code: non_empty(request.form_data.deposit_code.as_deref()).unwrap_or("N/A"),
        }
    }
}

/// Receipt text: itemised when it fits, otherwise a product count.
pub fn receipt_description(merchant: &str, request: &CheckoutRequest) -> String {
    let parties = ReceiptParties::from_request(request);
    let total = format_amount(request.amount);

    let items = if request.products.is_empty() {
        "Products not specified".to_string()
    } else {
        request
            .products
            .iter()
            .map(|line| {
                let name = non_empty(Some(line.name.as_str())).unwrap_or("Product");
                let quantity = line.quantity.max(1);
                let line_total = line.unit_price_ht * Decimal::from(quantity);
                format!("{name} x{quantity} = {}€", format_amount(line_total))
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let full = format!(
        "{merchant} - {} - Dr.{} (DV:{}) - {items} - TOTAL: {total}€",
        parties.customer, parties.doctor, parties.code
    );
    if full.chars().count() <= DESCRIPTION_MAX_CHARS {
        return full;
    }

    let short = format!(
        "{merchant} - {} - Dr.{} ({}) - {} product(s) - TOTAL: {total}€",
        parties.customer,
        parties.doctor,
        parties.code,
        request.products.len()
    );
    truncate_chars(&short, DESCRIPTION_MAX_CHARS)
}

/// `orderDate` and `orderTime` are in the server's local time.
fn intent_metadata(request: &CheckoutRequest, now: DateTime<Local>) -> BTreeMap<String, String> {
    let products_json = serde_json::to_string(&request.products).unwrap_or_default();
    let entries = [
        ("customerName", request.customer_info.full_name.clone()),
        ("customerEmail", request.customer_info.email.clone()),
        ("customerAddress", request.customer_info.address.clone()),
        (
            "depositCode",
            request.form_data.deposit_code.clone().unwrap_or_default(),
        ),
        (
            "doctorName",
            request.form_data.doctor_name.clone().unwrap_or_default(),
        ),
        ("orderAmount", format_amount(request.amount)),
        ("productCount", request.products.len().to_string()),
        ("products", products_json),
        ("orderDate", now.format("%Y-%m-%d").to_string()),
        ("orderTime", now.format("%H:%M:%S").to_string()),
    ];

    entries
        .into_iter()
        .map(|(key, value)| {
            (
                key.to_string(),
                truncate_chars(&value, METADATA_VALUE_MAX_CHARS),
            )
        })
        .collect()
}

pub async fn create_payment_intent(
    state: &AppState,
    request: CheckoutRequest,
) -> AppResult<ApiResponse<PaymentIntentCreated>> {
    let amount_minor = to_minor_units(request.amount)
        .ok_or_else(|| AppError::BadRequest("Invalid amount".into()))?;
    if amount_minor < MIN_CHARGE_MINOR {
        return Err(AppError::BelowMinimum);
    }

    let description = receipt_description(&state.config.merchant_label, &request);
    let deposit_code = non_empty(request.form_data.deposit_code.as_deref());
    let params = CreateIntentParams {
        amount_minor,
        currency: CURRENCY.to_string(),
        description: description.clone(),
        receipt_email: non_empty(Some(request.customer_info.email.as_str())).map(str::to_string),
        statement_descriptor: non_empty(Some(state.config.statement_descriptor.as_str()))
            .map(str::to_string),
        statement_descriptor_suffix: deposit_code
            .map(|code| truncate_chars(code, STATEMENT_SUFFIX_MAX_CHARS)),
        metadata: intent_metadata(&request, Local::now()),
    };

    tracing::info!(
        amount_minor,
        products = request.products.len(),
        deposit_code = deposit_code.unwrap_or("-"),
        customer_email = %request.customer_info.email,
        "creating payment intent"
    );

    let intent = state.processor.create_payment_intent(params).await?;
    let client_secret = intent.client_secret.clone().ok_or_else(|| {
        ProcessorError::UnexpectedResponse("payment intent has no client secret".into())
    })?;

    tracing::info!(payment_intent = %intent.id, "payment intent created");

    Ok(ApiResponse::success(
        "Payment intent created",
        PaymentIntentCreated {
            client_secret,
            payment_intent_id: intent.id,
            receipt_description: intent.description.unwrap_or(description),
        },
    ))
}

/// Verifies the intent with the processor, then appends the payment and
/// submission records. The client's claim of success is never trusted.
pub async fn record_payment_success(
    state: &AppState,
    request: RecordPaymentRequest,
) -> AppResult<ApiResponse<PaymentRecorded>> {
    let intent_id = request.payment_intent_id.trim();
    if intent_id.is_empty() {
        return Err(AppError::BadRequest("paymentIntentId is required".into()));
    }

    let intent = state.processor.retrieve_payment_intent(intent_id).await?;
    if intent.status != IntentStatus::Succeeded {
        tracing::warn!(payment_intent = %intent.id, status = ?intent.status, "payment not succeeded");
        return Err(AppError::PaymentNotConfirmed);
    }

    let now = Utc::now();
    let local = now.with_timezone(&Local);
    let amount = from_minor_units(intent.amount);
    let form = request.form_data;
    let details = form.order_details;

    let from_form_or_metadata = |value: Option<&str>, key: &str| {
        non_empty(value)
            .map(str::to_string)
            .or_else(|| intent.metadata.get(key).cloned())
            .filter(|v| !v.is_empty())
    };
    let deposit_code = from_form_or_metadata(details.deposit_code.as_deref(), "depositCode");
    let doctor_name = from_form_or_metadata(details.doctor_name.as_deref(), "doctorName");

    let payment = PaymentRecord {
        payment_intent_id: intent.id.clone(),
        amount,
        currency: intent.currency.clone(),
        status: "completed".into(),
        customer_info: form.customer_info.clone(),
        order_details: OrderDetails {
            deposit_code: deposit_code.clone(),
            doctor_name: doctor_name.clone(),
            products: form.products.clone(),
            order_date: local.format("%Y-%m-%d").to_string(),
            order_time: local.format("%H:%M:%S").to_string(),
            total_amount: amount,
            has_uploaded_file: details.has_uploaded_file,
            uploaded_file_name: details.uploaded_file_name.clone(),
        },
        payment_method: intent.payment_method.clone(),
        processor_metadata: intent.metadata.clone(),
        created_at: now,
        paid_at: DateTime::from_timestamp(intent.created, 0),
    };

    let submission = SubmissionRecord {
        payment_intent_id: intent.id.clone(),
        form: SubmittedForm {
            deposit_code,
            doctor_name,
            full_name: form.customer_info.full_name.clone(),
            email: form.customer_info.email.clone(),
            address: form.customer_info.address.clone(),
            products: form.products.clone(),
        },
        document_file: details.uploaded_file_name,
        payment_amount: amount,
        submitted_at: now,
        status: "completed".into(),
    };

    let appended = state.ledger.record_completed(&payment, &submission).await?;
    if !appended {
        tracing::info!(payment_intent = %intent.id, "payment already recorded, ledgers unchanged");
    }

    tracing::info!(
        payment_intent = %intent.id,
        amount = %format_amount(amount),
        customer_email = %form.customer_info.email,
        deposit_code = payment.order_details.deposit_code.as_deref().unwrap_or("-"),
        products = form.products.len(),
        has_document = details.has_uploaded_file,
        "payment recorded"
    );

    Ok(ApiResponse::success(
        "Payment confirmed",
        PaymentRecorded {
            payment_id: intent.id.clone(),
            receipt_sent: true,
            order_summary: OrderSummary {
                order_id: order_reference(&intent.id),
                total_amount: amount,
                products_count: form.products.len(),
                customer_email: form.customer_info.email,
                form_saved: true,
            },
        },
    ))
}

/// Short human reference derived from the intent id (`pi_3Nx7a...` → `3NX7A..`).
pub fn order_reference(intent_id: &str) -> String {
    intent_id.chars().skip(3).take(7).collect::<String>().to_uppercase()
}
