use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub mod selection;

pub const PLACEHOLDER_IMAGE: &str = "img/placeholder.png";

pub type ProductId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub brand: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Product {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.name)
    }

    pub fn display_category(&self) -> String {
        let mut chars = self.category.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Cuts the description to `max_chars` characters and marks the cut with `...`.
    pub fn short_description(&self, max_chars: usize) -> String {
        if self.description.chars().count() <= max_chars {
            return self.description.clone();
        }
        let mut short: String = self.description.chars().take(max_chars).collect();
        short.push_str("...");
        short
    }

    pub fn image_or_placeholder(&self) -> &str {
        match self.image.as_deref().map(str::trim) {
            Some(image) if !image.is_empty() => image,
            _ => PLACEHOLDER_IMAGE,
        }
    }

    /// Image file under `image_root`, or the placeholder when the reference has no file behind it.
    pub fn resolve_image(&self, image_root: &Path) -> PathBuf {
        let candidate = image_root.join(self.image_or_placeholder());
        if candidate.is_file() {
            candidate
        } else {
            image_root.join(PLACEHOLDER_IMAGE)
        }
    }

    fn matches(&self, lowered_term: &str) -> bool {
        [&self.name, &self.brand, &self.category, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(lowered_term))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("failed to read catalog at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("failed to parse catalog {source_ref}: {message}")]
    Parse { source_ref: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLoadDiagnostic {
    pub product_id: ProductId,
    pub reason: String,
}

impl CatalogLoadDiagnostic {
    pub fn to_log_line(&self) -> String {
        format!(
            "catalog load dropped product_id={} reason={}",
            self.product_id, self.reason
        )
    }
}

pub trait CatalogProvider: Send + Sync {
    fn source_ref(&self) -> String;

    fn load_products(&self) -> Result<Vec<Product>, CatalogError>;
}

pub struct FileCatalogProvider {
    path: PathBuf,
}

impl FileCatalogProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for FileCatalogProvider {
    fn source_ref(&self) -> String {
        self.path.display().to_string()
    }

    fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
        let raw = fs::read_to_string(&self.path).map_err(|err| CatalogError::Io {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        parse_catalog(&raw, &self.source_ref())
    }
}

pub fn parse_catalog(raw: &str, source_ref: &str) -> Result<Vec<Product>, CatalogError> {
    let document: CatalogDocument =
        serde_json::from_str(raw).map_err(|err| CatalogError::Parse {
            source_ref: source_ref.to_string(),
            message: err.to_string(),
        })?;
    Ok(document.products)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loading,
    Ready,
    Failed(CatalogError),
}

/// Read-only product index. Filled exactly once by [`CatalogIndex::install`].
#[derive(Debug)]
pub struct CatalogIndex {
    products: Vec<Arc<Product>>,
    state: CatalogState,
    diagnostics: Vec<CatalogLoadDiagnostic>,
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
            state: CatalogState::Loading,
            diagnostics: Vec::new(),
        }
    }

    /// Applies the outcome of the one-time catalog load. Later outcomes are ignored.
    pub fn install(&mut self, outcome: Result<Vec<Product>, CatalogError>) -> &CatalogState {
        if self.state != CatalogState::Loading {
            tracing::warn!("catalog already resolved, ignoring repeated load");
            return &self.state;
        }

        match outcome {
            Ok(products) => {
                let mut seen = BTreeSet::new();
                for product in products {
                    if !seen.insert(product.id) {
                        self.diagnostics.push(CatalogLoadDiagnostic {
                            product_id: product.id,
                            reason: "duplicate id".to_string(),
                        });
                        continue;
                    }
                    self.products.push(Arc::new(product));
                }
                for diagnostic in &self.diagnostics {
                    tracing::warn!("{}", diagnostic.to_log_line());
                }
                tracing::info!(products = self.products.len(), "catalog loaded");
                self.state = CatalogState::Ready;
            }
            Err(err) => {
                tracing::error!(error = %err, "catalog load failed");
                self.state = CatalogState::Failed(err);
            }
        }
        &self.state
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn diagnostics(&self) -> &[CatalogLoadDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, product_id: ProductId) -> Option<&Arc<Product>> {
        self.products.iter().find(|product| product.id == product_id)
    }

    pub fn search(&self, term: &str) -> Vec<Arc<Product>> {
        if term.trim().is_empty() {
            return self.products.clone();
        }

        let lowered = term.to_lowercase();
        self.products
            .iter()
            .filter(|product| product.matches(&lowered))
            .cloned()
            .collect()
    }
}
