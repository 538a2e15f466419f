//! Tracked asset catalog.
//!
//! A static, ordered mapping from a display category to the asset ids the game
//! scans. Order matters: the engine evaluates assets in catalog order.

use crate::domain::error::TradeBuddyError;
use crate::ports::config_port::ConfigPort;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub label: String,
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetCatalog {
    categories: Vec<Category>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),

    #[error("category {0} has no assets")]
    EmptyCategory(String),

    #[error("catalog has no categories")]
    Empty,
}

impl AssetCatalog {
    /// Build a catalog, rejecting empty categories and assets listed twice.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        if categories.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for category in &categories {
            if category.assets.is_empty() {
                return Err(CatalogError::EmptyCategory(category.label.clone()));
            }
            for asset in &category.assets {
                if !seen.insert(asset.clone()) {
                    return Err(CatalogError::DuplicateAsset(asset.clone()));
                }
            }
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// `(category label, asset id)` pairs in evaluation order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|c| {
            c.assets
                .iter()
                .map(move |a| (c.label.as_str(), a.as_str()))
        })
    }

    pub fn category_of(&self, asset: &str) -> Option<&str> {
        self.entries().find(|(_, a)| *a == asset).map(|(c, _)| c)
    }

    pub fn asset_count(&self) -> usize {
        self.categories.iter().map(|c| c.assets.len()).sum()
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        let category = |label: &str, asset: &str| Category {
            label: label.to_string(),
            assets: vec![asset.to_string()],
        };
        AssetCatalog {
            categories: vec![
                category("Fruits (Stocks)", "AAPL"),
                category("Veggies (Bonds)", "TLT"),
                category("Candy (Crypto/Memes)", "BTC-USD"),
            ],
        }
    }
}

pub fn parse_assets(input: &str) -> Result<Vec<String>, CatalogError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::EmptyToken);
        }
        let asset = trimmed.to_uppercase();
        if !seen.insert(asset.clone()) {
            return Err(CatalogError::DuplicateAsset(asset));
        }
        assets.push(asset);
    }

    Ok(assets)
}

/// Read the catalog from `[catalog] categories` and one `[category.<key>]`
/// section per key. Falls back to [`AssetCatalog::default`] when `[catalog]` is absent.
pub fn catalog_from_config(config: &dyn ConfigPort) -> Result<AssetCatalog, TradeBuddyError> {
    let keys = config.get_list("catalog", "categories");
    if keys.is_empty() {
        return Ok(AssetCatalog::default());
    }

    let invalid = |section: &str, key: &str, reason: String| TradeBuddyError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    };

    let mut categories = Vec::with_capacity(keys.len());
    for key in &keys {
        let section = format!("category.{}", key.to_lowercase());
        let label = config
            .get_string(&section, "label")
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| key.clone());
        let raw = config
            .get_string(&section, "assets")
            .ok_or_else(|| TradeBuddyError::ConfigMissing {
                section: section.clone(),
                key: "assets".to_string(),
            })?;
        let assets = parse_assets(&raw).map_err(|e| invalid(&section, "assets", e.to_string()))?;
        categories.push(Category {
            label: label.trim().to_string(),
            assets,
        });
    }

    AssetCatalog::new(categories).map_err(|e| invalid("catalog", "categories", e.to_string()))
}
