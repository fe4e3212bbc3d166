//! Client-side checkout flow: the three-step session, the QR scanner panel
//! and the payment controller. Browser collaborators (camera, QR decoder,
//! processor confirmation library, wallet sheet) sit behind traits.

pub mod checkout;
pub mod http;
pub mod scanner;
pub mod session;

pub use checkout::{CheckoutBackend, CheckoutController, CheckoutError, PaymentConfirmer};
pub use http::HttpCheckoutBackend;
pub use scanner::{CameraError, ScannerPanel};
pub use session::{Step, ValidationError, WizardSession};
