use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::{
    directory::normalize_code,
    dto::payments::{CheckoutRequest, CompletedForm, OrderContext, OrderDetailsInput},
    models::{CustomerInfo, DoctorRecord, OrderLine, ProductRecord},
    pricing::{MIN_CHARGE_MINOR, OrderTotals, to_minor_units},
};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Doctor,
    Customer,
    Products,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::Doctor => 1,
            Step::Customer => 2,
            Step::Products => 3,
        }
    }

    fn next(self) -> Self {
        match self {
            Step::Doctor => Step::Customer,
            Step::Customer | Step::Products => Step::Products,
        }
    }

    fn previous(self) -> Self {
        match self {
            Step::Doctor | Step::Customer => Step::Doctor,
            Step::Products => Step::Customer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid doctor code or scan the QR code")]
    DoctorNotConfirmed,

    #[error("Please enter your full name")]
    MissingFullName,

    #[error("Please enter a valid e-mail address")]
    InvalidEmail,

    #[error("Please select at least one product")]
    NoProductSelected,

    #[error("The minimum amount is 0.50 €")]
    BelowMinimum,
}

impl ValidationError {
    /// The step the user has to go back to.
    pub fn step(self) -> Step {
        match self {
            ValidationError::DoctorNotConfirmed => Step::Doctor,
            ValidationError::MissingFullName | ValidationError::InvalidEmail => Step::Customer,
            ValidationError::NoProductSelected | ValidationError::BelowMinimum => Step::Products,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedDoctor {
    pub code: String,
    pub name: String,
}

/// Everything the wizard has collected so far. One instance per checkout,
/// owned by the controller.
#[derive(Debug, Clone)]
pub struct WizardSession {
    step: Step,
    deposit_code: String,
    doctor: Option<ConfirmedDoctor>,
    products: Vec<ProductRecord>,
    quantities: Vec<u32>,
    customer: CustomerInfo,
    uploaded_document: Option<String>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            step: Step::Doctor,
            deposit_code: String::new(),
            doctor: None,
            products: Vec::new(),
            quantities: Vec::new(),
            customer: CustomerInfo::default(),
            uploaded_document: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn deposit_code(&self) -> &str {
        &self.deposit_code
    }

    pub fn doctor(&self) -> Option<&ConfirmedDoctor> {
        self.doctor.as_ref()
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn quantities(&self) -> &[u32] {
        &self.quantities
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn uploaded_document(&self) -> Option<&str> {
        self.uploaded_document.as_deref()
    }

    /// A different code drops the previous confirmation and catalogue.
    pub fn set_deposit_code(&mut self, code: &str) {
        let code = code.trim();
        if normalize_code(code) != normalize_code(&self.deposit_code) {
            self.doctor = None;
            self.products.clear();
            self.quantities.clear();
        }
        self.deposit_code = code.to_string();
    }

    /// Applies a lookup answer. Results for a code other than the current one
    /// are stale and ignored. Returns whether the code is now confirmed.
    pub fn apply_lookup(&mut self, record: Option<DoctorRecord>) -> bool {
        match record {
            Some(record) if normalize_code(&record.code) == normalize_code(&self.deposit_code) => {
                self.deposit_code = record.code.clone();
                self.quantities = vec![0; record.products.len()];
                self.products = record.products;
                self.doctor = Some(ConfirmedDoctor {
                    code: record.code,
                    name: record.name,
                });
                true
            }
            Some(record) => {
                tracing::debug!(stale = %record.code, current = %self.deposit_code, "ignoring stale lookup");
                self.doctor.is_some()
            }
            None => {
                self.doctor = None;
                self.products.clear();
                self.quantities.clear();
                false
            }
        }
    }

    pub fn set_customer(&mut self, customer: CustomerInfo) {
        self.customer = customer;
    }

    pub fn set_uploaded_document(&mut self, filename: Option<String>) {
        self.uploaded_document = filename;
    }

    /// Returns `false` when `index` is not a product of the current doctor.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> bool {
        match self.quantities.get_mut(index) {
            Some(slot) => {
                *slot = quantity;
                true
            }
            None => false,
        }
    }

    pub fn increment(&mut self, index: usize) -> bool {
        let current = self.quantities.get(index).copied();
        current.is_some_and(|q| self.set_quantity(index, q.saturating_add(1)))
    }

    pub fn decrement(&mut self, index: usize) -> bool {
        let current = self.quantities.get(index).copied();
        current.is_some_and(|q| self.set_quantity(index, q.saturating_sub(1)))
    }

    /// Products with a positive quantity, in catalogue order.
    pub fn selected_lines(&self) -> Vec<OrderLine> {
        self.products
            .iter()
            .zip(&self.quantities)
            .filter(|(_, qty)| **qty > 0)
            .map(|(product, qty)| OrderLine::new(product, *qty))
            .collect()
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals::compute(&self.selected_lines())
    }

    /// Amount shown on the wallet sheet, never below the processor minimum.
    pub fn wallet_total_minor(&self) -> i64 {
        to_minor_units(self.totals().total_ttc)
            .unwrap_or(MIN_CHARGE_MINOR)
            .max(MIN_CHARGE_MINOR)
    }

    pub fn validate_step(&self, step: Step) -> Result<(), ValidationError> {
        match step {
            Step::Doctor => {
                if self.doctor.is_none() {
                    return Err(ValidationError::DoctorNotConfirmed);
                }
            }
            Step::Customer => {
                if self.customer.full_name.trim().is_empty() {
                    return Err(ValidationError::MissingFullName);
                }
                if !is_valid_email(&self.customer.email) {
                    return Err(ValidationError::InvalidEmail);
                }
            }
            Step::Products => {
                let totals = self.totals();
                if self.quantities.iter().all(|q| *q == 0) {
                    return Err(ValidationError::NoProductSelected);
                }
                if !totals.is_chargeable() {
                    return Err(ValidationError::BelowMinimum);
                }
            }
        }
        Ok(())
    }

    /// Moves forward once the current step validates. The last step stays put.
    pub fn advance(&mut self) -> Result<Step, ValidationError> {
        self.validate_step(self.step)?;
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn go_back(&mut self) -> Step {
        self.step = self.step.previous();
        self.step
    }

    /// Checks every step in order. On failure the session moves to the first
    /// failing step.
    pub fn validate_all(&mut self) -> Result<(), ValidationError> {
        for step in [Step::Doctor, Step::Customer, Step::Products] {
            if let Err(err) = self.validate_step(step) {
                self.step = err.step();
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn order_context(&self) -> OrderContext {
        OrderContext {
            deposit_code: Some(self.deposit_code.clone()).filter(|c| !c.is_empty()),
            doctor_name: self.doctor.as_ref().map(|d| d.name.clone()),
        }
    }

    /// Body for the payment-intent and invoice endpoints; the amount is the
    /// tax-inclusive total.
    pub fn checkout_request(&self) -> CheckoutRequest {
        CheckoutRequest {
            amount: self.totals().total_ttc,
            products: self.selected_lines(),
            customer_info: self.customer.clone(),
            form_data: self.order_context(),
        }
    }

    pub fn completed_form(&self) -> CompletedForm {
        let context = self.order_context();
        CompletedForm {
            customer_info: self.customer.clone(),
            order_details: OrderDetailsInput {
                deposit_code: context.deposit_code,
                doctor_name: context.doctor_name,
                has_uploaded_file: self.uploaded_document.is_some(),
                uploaded_file_name: self.uploaded_document.clone(),
            },
            products: self.selected_lines(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn record(code: &str) -> DoctorRecord {
        DoctorRecord {
            code: code.into(),
            name: "Dr. Martin".into(),
            products: vec![
                ProductRecord {
                    name: "Gel".into(),
                    price: Decimal::new(1000, 2),
                },
                ProductRecord {
                    name: "Serum".into(),
                    price: Decimal::new(2550, 2),
                },
            ],
        }
    }

    fn confirmed() -> WizardSession {
        let mut session = WizardSession::new();
        session.set_deposit_code("dv001");
        assert!(session.apply_lookup(Some(record("DV001"))));
        session
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            address: String::new(),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let mut session = WizardSession::new();
        assert_eq!(session.advance(), Err(ValidationError::DoctorNotConfirmed));
        assert_eq!(session.step(), Step::Doctor);

        let mut session = confirmed();
        assert_eq!(session.advance(), Ok(Step::Customer));
        assert_eq!(session.advance(), Err(ValidationError::MissingFullName));

        session.set_customer(CustomerInfo {
            email: "nope".into(),
            ..customer()
        });
        assert_eq!(session.advance(), Err(ValidationError::InvalidEmail));

        session.set_customer(customer());
        assert_eq!(session.advance(), Ok(Step::Products));
        assert_eq!(session.advance(), Err(ValidationError::NoProductSelected));
        assert_eq!(session.go_back(), Step::Customer);
        assert_eq!(session.go_back(), Step::Doctor);
        assert_eq!(session.go_back(), Step::Doctor);
    }

    #[test]
    fn changing_code_drops_confirmation() {
        let mut session = confirmed();
        session.set_quantity(0, 2);

        session.set_deposit_code(" DV001 ");
        assert!(session.doctor().is_some());
        assert_eq!(session.quantities(), &[2, 0]);

        session.set_deposit_code("DV002");
        assert!(session.doctor().is_none());
        assert!(session.products().is_empty());
        assert!(session.selected_lines().is_empty());
    }

    #[test]
    fn stale_lookup_is_ignored() {
        let mut session = WizardSession::new();
        session.set_deposit_code("DV002");
        assert!(!session.apply_lookup(Some(record("DV001"))));
        assert!(session.doctor().is_none());

        assert!(!session.apply_lookup(None));
    }

    #[test]
    fn totals_follow_quantities() {
        let mut session = confirmed();
        assert!(session.increment(0));
        assert!(session.increment(0));
        assert!(session.set_quantity(1, 1));
        assert!(!session.set_quantity(5, 1));

        let totals = session.totals();
        assert_eq!(totals.subtotal_ht, Decimal::new(4550, 2));
        assert_eq!(totals.tax, Decimal::new(910, 2));
        assert_eq!(totals.total_ttc, Decimal::new(5460, 2));
        assert_eq!(session.wallet_total_minor(), 5460);

        let lines = session.selected_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price_ttc, Decimal::new(1200, 2));

        assert!(session.decrement(1));
        assert!(session.decrement(1));
        assert_eq!(session.quantities(), &[2, 0]);
    }

    #[test]
    fn wallet_total_never_below_minimum() {
        let session = confirmed();
        assert_eq!(session.wallet_total_minor(), MIN_CHARGE_MINOR);
    }

    #[test]
    fn tiny_order_is_below_minimum() {
        let mut session = WizardSession::new();
        session.set_deposit_code("DV009");
        session.apply_lookup(Some(DoctorRecord {
            code: "DV009".into(),
            name: "Dr. Small".into(),
            products: vec![ProductRecord {
                name: "Sample".into(),
                price: Decimal::new(10, 2),
            }],
        }));
        session.set_customer(customer());
        session.set_quantity(0, 3);

        assert_eq!(session.validate_all(), Err(ValidationError::BelowMinimum));
        assert_eq!(session.step(), Step::Products);
    }

    #[test]
    fn validate_all_moves_to_first_failing_step() {
        let mut session = confirmed();
        session.advance().unwrap();
        session.set_customer(customer());
        session.advance().unwrap();
        session.set_quantity(1, 1);
        assert_eq!(session.validate_all(), Ok(()));

        session.set_customer(CustomerInfo::default());
        assert_eq!(session.validate_all(), Err(ValidationError::MissingFullName));
        assert_eq!(session.step(), Step::Customer);
    }

    #[test]
    fn checkout_request_carries_selection() {
        let mut session = confirmed();
        session.set_customer(customer());
        session.set_quantity(1, 1);
        session.set_uploaded_document(Some("document-1-abc.pdf".into()));

        let request = session.checkout_request();
        assert_eq!(request.amount, Decimal::new(3060, 2));
        assert_eq!(request.products.len(), 1);
        assert_eq!(request.form_data.deposit_code.as_deref(), Some("DV001"));
        assert_eq!(request.form_data.doctor_name.as_deref(), Some("Dr. Martin"));

        let form = session.completed_form();
        assert!(form.order_details.has_uploaded_file);
        assert_eq!(
            form.order_details.uploaded_file_name.as_deref(),
            Some("document-1-abc.pdf")
        );
    }

    #[test]
    fn reset_starts_over() {
        let mut session = confirmed();
        session.advance().unwrap();
        session.reset();
        assert_eq!(session.step(), Step::Doctor);
        assert!(session.deposit_code().is_empty());
        assert!(session.doctor().is_none());
    }
}
