//! Seed catalog file format.
//!
//! A YAML fixture (`config/catalog.yaml` by default) describing a demo
//! catalog: categories, brands, and products with their dependent rows.
//! Prices are decimal strings so they survive serde untouched.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub brands: Vec<SeedBrand>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBrand {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedProduct {
    pub base_name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Decimal,
    /// Category name; must match an entry in `categories`.
    pub category: Option<String>,
    /// Brand name; must match an entry in `brands`.
    pub brand: Option<String>,
    #[serde(default)]
    pub variants: Vec<SeedVariant>,
    #[serde(default)]
    pub specifications: Vec<SeedSpecification>,
    #[serde(default)]
    pub compatibilities: Vec<SeedCompatibility>,
    #[serde(default)]
    pub delivery: Option<SeedDelivery>,
    #[serde(default)]
    pub faqs: Vec<SeedFaq>,
    #[serde(default)]
    pub carousel: Vec<SeedCarouselEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedVariant {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub color: String,
    pub stock: i32,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSpecification {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCompatibility {
    pub name: String,
    pub product_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDelivery {
    pub shipping_cost: Decimal,
    pub estimated_delivery_time: String,
    #[serde(default)]
    pub additional_info: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFaq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCarouselEntry {
    pub image: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Load and validate a seed catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (duplicate names, dangling category/brand references,
/// negative stock).
pub fn load_seed_catalog(path: &Path) -> Result<SeedCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let catalog: SeedCatalog = serde_yaml::from_str(&content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &SeedCatalog) -> Result<(), ConfigError> {
    let mut category_names = HashSet::new();
    for category in &catalog.categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must not be empty".to_string(),
            ));
        }
        if !category_names.insert(category.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category name: {}",
                category.name
            )));
        }
    }

    let mut brand_names = HashSet::new();
    for brand in &catalog.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must not be empty".to_string(),
            ));
        }
        if !brand_names.insert(brand.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: {}",
                brand.name
            )));
        }
    }

    for product in &catalog.products {
        if product.base_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "product base_name must not be empty".to_string(),
            ));
        }
        if let Some(ref category) = product.category {
            if !category_names.contains(category.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "product '{}' references unknown category '{category}'",
                    product.base_name
                )));
            }
        }
        if let Some(ref brand) = product.brand {
            if !brand_names.contains(brand.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "product '{}' references unknown brand '{brand}'",
                    product.base_name
                )));
            }
        }
        for variant in &product.variants {
            if variant.stock < 0 {
                return Err(ConfigError::Validation(format!(
                    "variant '{}' of product '{}' has negative stock",
                    variant.name, product.base_name
                )));
            }
        }
    }

    Ok(())
}
