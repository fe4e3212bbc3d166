use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub directory_path: PathBuf,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub stripe_secret_key: String,
    pub stripe_publishable_key: String,
    pub stripe_api_base: String,
    pub merchant_label: String,
    pub statement_descriptor: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let directory_path = env::var("DIRECTORY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/dv_codes.json"));
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let static_dir = env::var("STATIC_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            directory_path,
            data_dir,
            upload_dir,
            static_dir,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_publishable_key: env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            merchant_label: env::var("MERCHANT_LABEL").unwrap_or_else(|_| "FIDIA".to_string()),
            statement_descriptor: env::var("STATEMENT_DESCRIPTOR")
                .unwrap_or_else(|_| "FIDIA PHARMA".to_string()),
        })
    }

    /// Configuration rooted at `root`, used by the seed tool and tests.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            directory_path: root.join("dv_codes.json"),
            data_dir: root.clone(),
            upload_dir: root.join("uploads"),
            static_dir: None,
            stripe_secret_key: String::new(),
            stripe_publishable_key: String::new(),
            stripe_api_base: "https://api.stripe.com".to_string(),
            merchant_label: "FIDIA".to_string(),
            statement_descriptor: "FIDIA PHARMA".to_string(),
        }
    }

    pub fn payments_path(&self) -> PathBuf {
        self.data_dir.join("payments.json")
    }

    pub fn submissions_path(&self) -> PathBuf {
        self.data_dir.join("submissions.json")
    }
}
