use std::sync::Arc;

use crate::{
    config::AppConfig, directory::DirectoryStore, ledger::Ledger,
    processor::PaymentProcessor,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: DirectoryStore,
    pub ledger: Ledger,
    pub processor: Arc<dyn PaymentProcessor>,
}

impl AppState {
    pub fn new(config: AppConfig, processor: Arc<dyn PaymentProcessor>) -> Self {
        Self {
            directory: DirectoryStore::new(config.directory_path.clone()),
            ledger: Ledger::from_config(&config),
            config: Arc::new(config),
            processor,
        }
    }
}
