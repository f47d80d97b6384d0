//! Anomaly scanner: data-quality sweep over preorder-tagged titles.
//!
//! Diagnostics are persisted, deduplicated on (isbn, reason), and never
//! block ingestion or release; they exist for human review. The scan runs
//! on every catalog sync, so idempotence over unchanged data matters.

use chrono::{Duration, NaiveDate, Utc};
use folio_core::Isbn;
use sqlx::PgPool;

use crate::db::RepositoryError;
use crate::db::anomalies::{AnomalyRepository, PreorderAuditRow};

/// How stale a pub_date may be before it is flagged.
const STALE_PUB_DATE_DAYS: i64 = 30;

/// A detected data-quality problem. `as_str` values are the stored reason
/// strings and double as the dedup key, so they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyReason {
    /// No pub_date on a tagged preorder.
    MissingPubDate,
    /// pub_date present but not a `YYYY-MM-DD` date.
    MalformedPubDate,
    /// pub_date more than 30 days in the past and still tagged.
    StalePubDate,
    /// ISBN fails the 13-digit-numeric shape check.
    MalformedIsbn,
    /// Released title still carrying the preorder tag (catalog drift).
    TaggedAfterRelease,
}

impl AnomalyReason {
    /// The stored reason string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingPubDate => "Missing pub_date",
            Self::MalformedPubDate => "Malformed pub_date",
            Self::StalePubDate => "pub_date older than 30 days",
            Self::MalformedIsbn => "Missing or malformed ISBN",
            Self::TaggedAfterRelease => "Tagged preorder after release",
        }
    }
}

/// Sweeps tagged preorders and logs deduplicated diagnostics.
pub struct AnomalyScanner<'a> {
    pool: &'a PgPool,
}

impl<'a> AnomalyScanner<'a> {
    /// Create a new anomaly scanner.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run one sweep and return the number of newly logged diagnostics.
    ///
    /// A second run over unchanged data returns 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn scan(&self) -> Result<usize, RepositoryError> {
        let repo = AnomalyRepository::new(self.pool);
        let titles = repo.tagged_preorders().await?;
        let released = repo.released_isbns().await?;
        let today = Utc::now().date_naive();

        let mut new_rows = 0;
        for title in &titles {
            for reason in title_anomalies(title, released.contains(&title.isbn), today) {
                if repo.insert(&title.isbn, reason.as_str()).await? {
                    new_rows += 1;
                }
            }
        }

        if new_rows > 0 {
            tracing::info!(new_rows, scanned = titles.len(), "anomaly scan logged new rows");
        }

        Ok(new_rows)
    }
}

/// Evaluate all anomaly rules for one title. Rules fire independently, so a
/// single ISBN can yield several reasons in one scan.
fn title_anomalies(
    title: &PreorderAuditRow,
    released: bool,
    today: NaiveDate,
) -> Vec<AnomalyReason> {
    let mut reasons = Vec::new();

    match title.pub_date.as_deref().map(str::trim) {
        None | Some("") => reasons.push(AnomalyReason::MissingPubDate),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(pub_date) => {
                if pub_date < today - Duration::days(STALE_PUB_DATE_DAYS) {
                    reasons.push(AnomalyReason::StalePubDate);
                }
            }
            Err(_) => reasons.push(AnomalyReason::MalformedPubDate),
        },
    }

    if !Isbn::is_well_formed(&title.isbn) {
        reasons.push(AnomalyReason::MalformedIsbn);
    }

    if released && title.tagged_preorder {
        reasons.push(AnomalyReason::TaggedAfterRelease);
    }

    reasons
}
