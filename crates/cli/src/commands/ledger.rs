//! Release management and reconciliation commands.

use folio_core::Isbn;
use folio_server::db::{LedgerRepository, PreorderRepository, ReleaseOutcome, ReleaseRepository};
use folio_server::services::{AnomalyScanner, ReadinessAnalyzer};
use sqlx::PgPool;

/// List the titles ready for release.
pub async fn ready(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let ready = ReadinessAnalyzer::new(pool).analyze().await?;
    if ready.is_empty() {
        println!("No preorders ready for release.");
        return Ok(());
    }
    for title in ready {
        println!("{} - {}", title.isbn, title.title.as_deref().unwrap_or(""));
    }
    Ok(())
}

/// Finalize one release. Exits non-zero unless this call performed the
/// transition, so scripted approvals notice double-processing.
pub async fn release(
    pool: &PgPool,
    isbn: &str,
    approver: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Operator input gets the strict shape check; the ledger itself
    // tolerates malformed ISBNs so the scanner can report them.
    let isbn = Isbn::parse(isbn)?;

    let outcome = ReleaseRepository::new(pool)
        .release_preorder(isbn.as_str(), approver)
        .await?;

    match outcome {
        ReleaseOutcome::Released(record) => {
            println!(
                "Released {} (approved by {}, inventory {}, presales {})",
                record.isbn,
                approver,
                record.inventory_on_release,
                record.total_presales
            );
            Ok(())
        }
        ReleaseOutcome::AlreadyReleased => Err(format!("{isbn} is already released").into()),
        ReleaseOutcome::NotEligible => {
            Err(format!("{isbn} is not an active preorder").into())
        }
    }
}

/// Run the anomaly sweep and report how many new diagnostics were logged.
pub async fn scan(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let new_rows = AnomalyScanner::new(pool).scan().await?;
    println!("Anomaly scan complete: {new_rows} new diagnostics");
    Ok(())
}

/// Recompute presale totals into `presales_log`.
pub async fn recompute(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let titles = LedgerRepository::new(pool).recompute_presales().await?;
    println!("Presale totals recomputed for {titles} titles");
    Ok(())
}

/// Print a title's lifecycle status, derived from the release record.
pub async fn status(pool: &PgPool, isbn: &str) -> Result<(), Box<dyn std::error::Error>> {
    let isbn = Isbn::parse(isbn)?;
    let status = PreorderRepository::new(pool)
        .title_status(isbn.as_str())
        .await?;
    println!("{isbn}: {status}");
    Ok(())
}
