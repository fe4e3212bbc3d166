//! Payment orchestration for the wizard: card path and wallet path, both
//! ending in a server-side record of the verified payment.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    dto::{
        doctors::DoctorLookup,
        payments::{CheckoutRequest, PaymentIntentCreated, PaymentRecorded, RecordPaymentRequest},
    },
    models::DoctorRecord,
    processor::IntentStatus,
    wizard::{
        scanner::{ScanOutcome, ScannerPanel},
        session::{ValidationError, WizardSession},
    },
};

/// Country sent with card billing details.
pub const BILLING_COUNTRY: &str = "FR";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered `{ success: false, error }`.
    #[error("{0}")]
    Rejected(String),

    /// The processor's client library refused the confirmation.
    #[error("{0}")]
    Processor(String),

    #[error("Payment was not completed (status: {0:?})")]
    NotCompleted(IntentStatus),

    #[error("Wallet payment is not available on this device")]
    WalletUnavailable,

    #[error("Invalid server address: {0}")]
    InvalidBaseUrl(String),

    #[error("Unable to reach the server: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Server endpoints the wizard talks to.
#[automock]
#[async_trait]
pub trait CheckoutBackend: Send + Sync {
    /// `Ok(None)` when the code is unknown.
    async fn lookup_doctor(&self, code: &str) -> Result<Option<DoctorLookup>, CheckoutError>;

    async fn publishable_key(&self) -> Result<String, CheckoutError>;

    async fn create_payment_intent(
        &self,
        request: &CheckoutRequest,
    ) -> Result<PaymentIntentCreated, CheckoutError>;

    async fn record_payment_success(
        &self,
        request: &RecordPaymentRequest,
    ) -> Result<PaymentRecorded, CheckoutError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
    pub address_line1: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardConfirmation {
    pub client_secret: String,
    pub billing_details: BillingDetails,
    pub receipt_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedIntent {
    pub id: String,
    pub status: IntentStatus,
}

/// The processor's client-side confirmation library. Card data never passes
/// through this crate; implementations confirm with their own card element.
#[automock]
#[async_trait]
pub trait PaymentConfirmer: Send + Sync {
    async fn confirm_card(
        &self,
        confirmation: CardConfirmation,
    ) -> Result<ConfirmedIntent, CheckoutError>;

    /// Confirms with a wallet-supplied payment method. With
    /// `handle_actions == false` an intent needing authentication comes back
    /// as `requires_action`.
    async fn confirm_wallet(
        &self,
        client_secret: &str,
        payment_method: &str,
        handle_actions: bool,
    ) -> Result<ConfirmedIntent, CheckoutError>;

    /// Second round-trip that runs the pending authentication.
    async fn confirm_pending(&self, client_secret: &str) -> Result<ConfirmedIntent, CheckoutError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletCompletion {
    Success,
    Fail,
}

/// The platform payment sheet, closed with the result of the confirmation.
#[automock]
pub trait WalletSheet: Send {
    fn complete(&mut self, outcome: WalletCompletion);
}

#[derive(Debug, Clone)]
pub struct PaymentSuccess {
    pub message: String,
    pub recorded: PaymentRecorded,
}

pub struct CheckoutController {
    backend: Arc<dyn CheckoutBackend>,
    confirmer: Arc<dyn PaymentConfirmer>,
    session: WizardSession,
    scanner: Option<ScannerPanel>,
    wallet_available: bool,
}

impl CheckoutController {
    pub fn new(backend: Arc<dyn CheckoutBackend>, confirmer: Arc<dyn PaymentConfirmer>) -> Self {
        Self {
            backend,
            confirmer,
            session: WizardSession::new(),
            scanner: None,
            wallet_available: false,
        }
    }

    pub fn with_scanner(mut self, scanner: ScannerPanel) -> Self {
        self.scanner = Some(scanner);
        self
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut WizardSession {
        &mut self.session
    }

    pub fn scanner_mut(&mut self) -> Option<&mut ScannerPanel> {
        self.scanner.as_mut()
    }

    /// Records what the platform reported about wallet support.
    pub fn set_wallet_available(&mut self, available: bool) {
        self.wallet_available = available;
    }

    pub fn wallet_button_visible(&self) -> bool {
        self.wallet_available
    }

    /// Current wallet sheet total in minor units.
    pub fn wallet_total_minor(&self) -> i64 {
        self.session.wallet_total_minor()
    }

    /// Sets the code and confirms it against the server directory.
    pub async fn confirm_deposit_code(&mut self, code: &str) -> Result<bool, CheckoutError> {
        self.session.set_deposit_code(code);
        if self.session.deposit_code().is_empty() {
            return Ok(self.session.apply_lookup(None));
        }

        let found = self.backend.lookup_doctor(self.session.deposit_code()).await?;
        let record = found.map(|lookup| DoctorRecord {
            code: lookup.code,
            name: lookup.name,
            products: lookup.products,
        });
        Ok(self.session.apply_lookup(record))
    }

    /// Feeds decoded QR text to the scanner; an accepted code is confirmed
    /// right away.
    pub async fn on_scanned(&mut self, text: &str) -> Result<Option<String>, CheckoutError> {
        let outcome = match self.scanner.as_mut() {
            Some(scanner) => scanner.on_decoded(text),
            None => return Ok(None),
        };
        match outcome {
            ScanOutcome::Accepted(found) => {
                self.confirm_deposit_code(&found.code).await?;
                Ok(Some(found.code))
            }
            ScanOutcome::Rejected(_) => Ok(None),
        }
    }

    fn card_confirmation(&self, client_secret: String) -> CardConfirmation {
        let customer = self.session.customer();
        let address = customer.address.trim();
        CardConfirmation {
            client_secret,
            billing_details: BillingDetails {
                name: customer.full_name.trim().to_string(),
                email: customer.email.trim().to_string(),
                address_line1: (!address.is_empty()).then(|| address.to_string()),
                country: BILLING_COUNTRY.to_string(),
            },
            receipt_email: customer.email.trim().to_string(),
        }
    }

    pub async fn pay_with_card(&mut self) -> Result<PaymentSuccess, CheckoutError> {
        self.session.validate_all()?;
        let request = self.session.checkout_request();

        let created = self.backend.create_payment_intent(&request).await?;
        let confirmation = self.card_confirmation(created.client_secret);
        let intent = self.confirmer.confirm_card(confirmation).await?;
        if intent.status != IntentStatus::Succeeded {
            return Err(CheckoutError::NotCompleted(intent.status));
        }

        self.finish(&intent.id, "Payment successful").await
    }

    /// Wallet sheet handler. The sheet is always completed, with `Fail` when
    /// anything before the first confirmation goes wrong.
    pub async fn pay_with_wallet(
        &mut self,
        payment_method: &str,
        sheet: &mut dyn WalletSheet,
    ) -> Result<PaymentSuccess, CheckoutError> {
        let created = match self.start_wallet_payment(payment_method).await {
            Ok(created) => created,
            Err(err) => {
                sheet.complete(WalletCompletion::Fail);
                return Err(err);
            }
        };
        sheet.complete(WalletCompletion::Success);

        let (client_secret, mut intent) = created;
        if intent.status == IntentStatus::RequiresAction {
            intent = self.confirmer.confirm_pending(&client_secret).await?;
        }
        if intent.status != IntentStatus::Succeeded {
            return Err(CheckoutError::NotCompleted(intent.status));
        }

        self.finish(&intent.id, "Payment successful via wallet").await
    }

    async fn start_wallet_payment(
        &mut self,
        payment_method: &str,
    ) -> Result<(String, ConfirmedIntent), CheckoutError> {
        if !self.wallet_available {
            return Err(CheckoutError::WalletUnavailable);
        }
        self.session.validate_all()?;

        let request = self.session.checkout_request();
        let created = self.backend.create_payment_intent(&request).await?;
        let intent = self
            .confirmer
            .confirm_wallet(&created.client_secret, payment_method, false)
            .await?;
        Ok((created.client_secret, intent))
    }

    async fn finish(
        &mut self,
        payment_intent_id: &str,
        message: &str,
    ) -> Result<PaymentSuccess, CheckoutError> {
        let request = RecordPaymentRequest {
            payment_intent_id: payment_intent_id.to_string(),
            form_data: self.session.completed_form(),
        };
        let recorded = self.backend.record_payment_success(&request).await?;
        tracing::info!(payment_intent = %payment_intent_id, "checkout completed");

        self.reset();
        Ok(PaymentSuccess {
            message: message.to_string(),
            recorded,
        })
    }

    /// Back to step 1 with an empty session; the scanner is released.
    pub fn reset(&mut self) {
        self.session.reset();
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.close();
        }
    }
}
