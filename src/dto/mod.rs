pub mod doctors;
pub mod documents;
pub mod invoices;
pub mod payments;
