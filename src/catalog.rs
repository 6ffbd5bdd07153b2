//! Product catalog lookup used by `add_item`.
//!
//! The CLI reads products from `<home>/catalog.yaml`:
//!
//! ```yaml
//! products:
//!   - id: P-100
//!     name: Widget
//!     list_price: '12.00'
//!     sale_price: '10.00'
//! ```

use crate::error::{QuoteError, Result};
use crate::quote::ProductInfo;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Resolves product references to priced product data.
pub trait Catalog: Send + Sync {
    fn resolve(&self, product_ref: &str) -> Result<ProductInfo>;
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<ProductInfo>,
}

/// Catalog loaded once from a YAML file.
#[derive(Debug, Default, Clone)]
pub struct FileCatalog {
    products: HashMap<String, ProductInfo>,
}

impl FileCatalog {
    /// Load the catalog; a missing file is an empty catalog.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            QuoteError::UserError(format!(
                "failed to read catalog '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse catalog YAML.
    pub fn parse(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)
            .map_err(|e| QuoteError::UserError(format!("failed to parse catalog: {}", e)))?;

        let mut products = HashMap::new();
        for product in file.products {
            if product.sale_price.is_some_and(|sale| sale > product.list_price) {
                return Err(QuoteError::UserError(format!(
                    "catalog product '{}' has a sale price above its list price",
                    product.id
                )));
            }
            if products.insert(product.id.clone(), product).is_some() {
                return Err(QuoteError::UserError(
                    "catalog lists the same product id twice".to_string(),
                ));
            }
        }
        Ok(Self { products })
    }

    pub fn from_products(products: impl IntoIterator<Item = ProductInfo>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for FileCatalog {
    fn resolve(&self, product_ref: &str) -> Result<ProductInfo> {
        self.products
            .get(product_ref)
            .cloned()
            .ok_or_else(|| QuoteError::NotFound(format!("product '{}'", product_ref)))
    }
}
