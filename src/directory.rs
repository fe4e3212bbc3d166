//! Doctor directory: a JSON object keyed by deposit code.
//!
//! ```json
//! { "DV001": { "name": "Dr. Martin", "products": [{ "name": "Gel", "price": 10.0 }] },
//!   "DV002": "Dr. Bernard" }
//! ```

use std::{collections::BTreeMap, path::PathBuf};

use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{DoctorRecord, ProductRecord},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DirectoryEntry {
    Detailed {
        name: String,
        #[serde(default)]
        products: Vec<ProductRecord>,
    },
    NameOnly(String),
}

#[derive(Debug, Clone, Default)]
pub struct DoctorDirectory {
    entries: BTreeMap<String, DirectoryEntry>,
}

/// Lookup key for a deposit code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

impl DoctorDirectory {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let entries = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact match on the normalized code; no partial or fuzzy matching.
    pub fn find(&self, code: &str) -> Option<DoctorRecord> {
        let wanted = normalize_code(code);
        if wanted.is_empty() {
            return None;
        }

        let (key, entry) = self
            .entries
            .iter()
            .find(|(key, _)| normalize_code(key) == wanted)?;

        let (name, products) = match entry {
            DirectoryEntry::Detailed { name, products } => (name.clone(), products.clone()),
            DirectoryEntry::NameOnly(name) => (name.clone(), Vec::new()),
        };

        Some(DoctorRecord {
            code: key.trim().to_string(),
            name,
            products,
        })
    }
}

/// Reads the directory file on every load so manual edits apply without a
/// restart. The service never writes it.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    path: PathBuf,
}

impl DirectoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> AppResult<DoctorDirectory> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(DoctorDirectory::from_json(&raw)?)
    }
}
