//! Catalog sync ingestion command.

use std::path::Path;

use folio_core::CatalogProduct;
use folio_server::db::PreorderRepository;
use folio_server::services::AnomalyScanner;
use sqlx::PgPool;

/// Upsert a JSON batch of catalog products, then run the anomaly sweep.
///
/// The external sync collaborator produces the file; this command only
/// moves it into the `preorders` table. Malformed pub_dates and ISBNs are
/// accepted on purpose so the scan that follows can report them.
pub async fn run(pool: &PgPool, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)?;
    let products: Vec<CatalogProduct> = serde_json::from_str(&raw)?;

    let written = PreorderRepository::new(pool).sync(&products).await?;
    println!("Catalog sync: {written} titles upserted");

    let new_rows = AnomalyScanner::new(pool).scan().await?;
    println!("Anomaly scan complete: {new_rows} new diagnostics");

    Ok(())
}
