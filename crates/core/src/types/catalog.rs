//! Catalog product record supplied by the external sync collaborator.

use serde::{Deserialize, Serialize};

/// Product metadata as refreshed from the catalog.
///
/// The sync collaborator owns the mapping from Shopify product data to this
/// shape; the ledger upserts it verbatim into `preorders`. `pub_date` stays
/// a raw string here so that malformed dates reach the anomaly scanner
/// instead of being rejected at sync time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Business key for the title; may be malformed, the scanner flags it.
    pub isbn: String,
    /// Title of the book.
    #[serde(default)]
    pub title: Option<String>,
    /// Publisher/vendor name.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Publication date as `YYYY-MM-DD`, if known.
    #[serde(default)]
    pub pub_date: Option<String>,
    /// Whether the product carries the preorder tag.
    #[serde(default)]
    pub tagged_preorder: bool,
    /// Whether the product sits in the preorder collection (informational).
    #[serde(default)]
    pub in_preorder_collection: bool,
    /// Inventory level at sync time.
    #[serde(default)]
    pub inventory: i32,
}
