use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        doctors::{DoctorLookup, ProductList, PublicConfig},
        documents::DocumentUploaded,
        invoices::InvoiceCreated,
        payments::{
            CheckoutRequest, CompletedForm, OrderContext, OrderDetailsInput, OrderSummary,
            PaymentIntentCreated, PaymentRecorded, RecordPaymentRequest,
        },
    },
    models::{CustomerInfo, OrderLine, ProductRecord, UploadedDocument},
    response::{ApiResponse, ErrorBody},
    routes::{doctors, documents, health, invoices, payments, settings},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        doctors::get_doctor,
        doctors::list_products,
        settings::public_config,
        payments::create_payment_intent,
        payments::record_payment_success,
        documents::upload_document,
        invoices::create_detailed_invoice
    ),
    components(
        schemas(
            ProductRecord,
            CustomerInfo,
            OrderLine,
            UploadedDocument,
            DoctorLookup,
            ProductList,
            PublicConfig,
            OrderContext,
            CheckoutRequest,
            PaymentIntentCreated,
            OrderDetailsInput,
            CompletedForm,
            RecordPaymentRequest,
            OrderSummary,
            PaymentRecorded,
            DocumentUploaded,
            documents::DocumentUploadForm,
            InvoiceCreated,
            ErrorBody,
            ApiResponse<DoctorLookup>,
            ApiResponse<PaymentIntentCreated>,
            ApiResponse<PaymentRecorded>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Doctors", description = "Deposit code lookup"),
        (name = "Config", description = "Public client configuration"),
        (name = "Payments", description = "Payment intents and confirmation"),
        (name = "Documents", description = "Supporting document upload"),
        (name = "Invoices", description = "Itemised invoices"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
