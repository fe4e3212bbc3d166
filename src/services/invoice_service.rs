use std::collections::BTreeMap;

use chrono::Utc;

use crate::{
    dto::{invoices::InvoiceCreated, payments::CheckoutRequest},
    error::{AppError, AppResult},
    pricing::to_minor_units,
    processor::{CURRENCY, CustomerParams, InvoiceItemParams, InvoiceParams},
    response::ApiResponse,
    services::payment_service::non_empty,
    state::AppState,
};

const INVOICE_DAYS_UNTIL_DUE: u32 = 30;
const CUSTOMER_COUNTRY: &str = "FR";

/// Creates a processor customer and a finalized invoice with one line per
/// product, for orders that need an itemised document.
pub async fn create_detailed_invoice(
    state: &AppState,
    request: CheckoutRequest,
) -> AppResult<ApiResponse<InvoiceCreated>> {
    let lines: Vec<_> = request.products.iter().filter(|l| l.quantity > 0).collect();
    if lines.is_empty() {
        return Err(AppError::BadRequest(
            "At least one product is required".into(),
        ));
    }
    let email = non_empty(Some(request.customer_info.email.as_str()))
        .ok_or_else(|| AppError::BadRequest("Customer email is required".into()))?;

    let doctor = non_empty(request.form_data.doctor_name.as_deref()).unwrap_or("N/A");
    let code = non_empty(request.form_data.deposit_code.as_deref()).unwrap_or("N/A");
    let processor = &state.processor;

    let customer = processor
        .create_customer(CustomerParams {
            email: email.to_string(),
            name: request.customer_info.full_name.clone(),
            address_line1: non_empty(Some(request.customer_info.address.as_str()))
                .map(str::to_string),
            country: CUSTOMER_COUNTRY.to_string(),
            metadata: BTreeMap::from([
                ("depositCode".to_string(), code.to_string()),
                ("doctorName".to_string(), doctor.to_string()),
            ]),
        })
        .await?;

    let invoice = processor
        .create_invoice(InvoiceParams {
            customer_id: customer.id.clone(),
            description: format!(
                "{} order - Dr. {doctor} (DV: {code})",
                state.config.merchant_label
            ),
            days_until_due: INVOICE_DAYS_UNTIL_DUE,
            metadata: BTreeMap::from([
                ("doctorName".to_string(), doctor.to_string()),
                ("depositCode".to_string(), code.to_string()),
                ("orderDate".to_string(), Utc::now().to_rfc3339()),
            ]),
        })
        .await?;

    for line in &lines {
        let unit_amount_minor = to_minor_units(line.unit_price_ht)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid price for {}", line.name)))?;
        processor
            .add_invoice_item(InvoiceItemParams {
                customer_id: customer.id.clone(),
                invoice_id: invoice.id.clone(),
                currency: CURRENCY.to_string(),
                description: format!("{} (Dr. {doctor})", line.name),
                unit_amount_minor,
                quantity: line.quantity,
            })
            .await?;
    }

    let finalized = processor.finalize_invoice(&invoice.id).await?;

    tracing::info!(
        invoice = %finalized.id,
        customer = %customer.id,
        lines = lines.len(),
        "detailed invoice created"
    );

    Ok(ApiResponse::success(
        "Invoice created",
        InvoiceCreated {
            invoice_id: finalized.id,
            invoice_url: finalized.hosted_invoice_url,
            payment_intent_id: finalized.payment_intent,
        },
    ))
}
