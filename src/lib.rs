pub mod config;
pub mod directory;
pub mod dto;
pub mod error;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod processor;
pub mod qr;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod wizard;
