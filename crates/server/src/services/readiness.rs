//! Readiness analyzer: which preorder titles are eligible for release.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::db::RepositoryError;

/// A title eligible for release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyTitle {
    /// ISBN of the title.
    pub isbn: String,
    /// Title, if the catalog sync provided one.
    pub title: Option<String>,
}

/// One preorder row joined with its presale total and release marker.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReadinessRow {
    pub isbn: String,
    pub title: Option<String>,
    pub pub_date: Option<String>,
    pub tagged_preorder: bool,
    pub in_preorder_collection: bool,
    pub presale_qty: i32,
    pub released: bool,
}

/// Computes the set of ISBNs eligible for release.
pub struct ReadinessAnalyzer<'a> {
    pool: &'a PgPool,
}

impl<'a> ReadinessAnalyzer<'a> {
    /// Create a new readiness analyzer.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the titles ready for release as of today.
    ///
    /// No ordering guarantee; callers treat the result as a set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails. A malformed
    /// pub_date never fails the analysis - the row is excluded with a
    /// diagnostic so one bad title cannot block all the others.
    pub async fn analyze(&self) -> Result<Vec<ReadyTitle>, RepositoryError> {
        let rows: Vec<ReadinessRow> = sqlx::query_as(
            r"
            SELECT p.isbn, p.title, p.pub_date, p.tagged_preorder,
                   p.in_preorder_collection,
                   COALESCE(l.presale_qty, 0) AS presale_qty,
                   (r.isbn IS NOT NULL) AS released
            FROM preorders p
            LEFT JOIN presales_log l ON l.isbn = p.isbn
            LEFT JOIN releases_log r ON r.isbn = p.isbn
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(evaluate(&rows, Utc::now().date_naive()))
    }
}

/// Apply the readiness rules to the joined rows.
///
/// A title is ready when: it has no release record, its pub_date parses and
/// has passed, it has accumulated presales, and it still carries the
/// preorder tag. The tag is the canonical preorder signal; collection
/// membership is informational only.
fn evaluate(rows: &[ReadinessRow], today: NaiveDate) -> Vec<ReadyTitle> {
    let mut ready = Vec::new();
    for row in rows {
        if row.released {
            continue;
        }

        let Some(pub_date) = row.pub_date.as_deref() else {
            tracing::warn!(isbn = %row.isbn, "missing pub_date, excluded from readiness");
            continue;
        };
        let Ok(pub_date) = NaiveDate::parse_from_str(pub_date, "%Y-%m-%d") else {
            tracing::warn!(isbn = %row.isbn, "malformed pub_date, excluded from readiness");
            continue;
        };
        if pub_date > today {
            continue;
        }

        if row.presale_qty <= 0 {
            continue;
        }

        if !row.tagged_preorder {
            continue;
        }

        ready.push(ReadyTitle {
            isbn: row.isbn.clone(),
            title: row.title.clone(),
        });
    }
    ready
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(isbn: &str, pub_date: Option<&str>, qty: i32) -> ReadinessRow {
        ReadinessRow {
            isbn: isbn.to_string(),
            title: Some(format!("Title {isbn}")),
            pub_date: pub_date.map(str::to_string),
            tagged_preorder: true,
            in_preorder_collection: true,
            presale_qty: qty,
            released: false,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
    }

    #[test]
    fn test_ready_title_passes_all_rules() {
        let rows = vec![row("1234567890123", Some("2024-06-14"), 3)];
        let ready = evaluate(&rows, today());
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].isbn, "1234567890123");
    }

    #[test]
    fn test_pub_date_today_is_ready() {
        let rows = vec![row("1234567890123", Some("2024-06-15"), 1)];
        assert_eq!(evaluate(&rows, today()).len(), 1);
    }

    #[test]
    fn test_future_pub_date_excluded() {
        let rows = vec![row("1234567890123", Some("2024-06-16"), 3)];
        assert!(evaluate(&rows, today()).is_empty());
    }

    #[test]
    fn test_missing_or_malformed_pub_date_excluded_without_panic() {
        let rows = vec![
            row("1111111111111", None, 3),
            row("2222222222222", Some("06/14/2024"), 3),
            row("3333333333333", Some("not a date"), 3),
        ];
        assert!(evaluate(&rows, today()).is_empty());
    }

    #[test]
    fn test_zero_presales_excluded() {
        let rows = vec![
            row("1111111111111", Some("2024-06-01"), 0),
            row("2222222222222", Some("2024-06-01"), -2),
        ];
        assert!(evaluate(&rows, today()).is_empty());
    }

    #[test]
    fn test_released_title_excluded() {
        let mut released = row("1234567890123", Some("2024-06-01"), 3);
        released.released = true;
        assert!(evaluate(&[released], today()).is_empty());
    }

    #[test]
    fn test_untagged_title_excluded_even_if_in_collection() {
        let mut untagged = row("1234567890123", Some("2024-06-01"), 3);
        untagged.tagged_preorder = false;
        untagged.in_preorder_collection = true;
        assert!(evaluate(&[untagged], today()).is_empty());
    }

    #[test]
    fn test_one_bad_row_does_not_block_others() {
        let rows = vec![
            row("1111111111111", Some("garbage"), 3),
            row("2222222222222", Some("2024-06-01"), 2),
        ];
        let ready = evaluate(&rows, today());
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].isbn, "2222222222222");
    }
}
