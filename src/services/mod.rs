pub mod document_service;
pub mod doctor_service;
pub mod invoice_service;
pub mod payment_service;
