//! Typed order/refund webhook payloads and their normalization.
//!
//! Shopify webhook bodies arrive as loosely-shaped JSON. Everything the
//! ledger ingests goes through the records here: deserialization tolerates
//! the quirks we have seen in practice (numeric or string order ids, the
//! ISBN living in `barcode`, missing quantities), and a single
//! normalization step turns a payload into flat ledger entries plus a
//! count of line items skipped for having no resolvable ISBN.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

// =============================================================================
// Payload Types
// =============================================================================

/// An order payload as delivered by the `orders/create` and `orders/updated`
/// webhook topics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPayload {
    /// Shopify order id. Numeric in REST webhooks, string in some exports.
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    /// Fallback key used by older export payloads.
    #[serde(default, deserialize_with = "de_opt_id")]
    pub order_id: Option<String>,
    /// When the order was placed.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Set when the order has been cancelled.
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Line items on the order.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Refund sub-objects attached by `orders/updated` deliveries.
    #[serde(default)]
    pub refunds: Vec<RefundPayload>,
}

/// One line item on an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItem {
    /// The barcode field, which carries the ISBN for book products.
    #[serde(default)]
    pub barcode: Option<String>,
    /// Explicit ISBN field used by normalized export payloads.
    #[serde(default)]
    pub isbn: Option<String>,
    /// Quantity ordered.
    #[serde(default)]
    pub quantity: Option<i32>,
}

/// One refund event inside an order payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundPayload {
    /// When the refund was created; defaults to "now" at normalization.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// The refunded line items.
    #[serde(default)]
    pub refund_line_items: Vec<RefundLineItem>,
}

/// One refunded line item inside a refund event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundLineItem {
    /// Quantity refunded.
    #[serde(default)]
    pub quantity: Option<i32>,
    /// The original line item, carrying the barcode/ISBN.
    #[serde(default)]
    pub line_item: LineItem,
}

/// Accept an id that is either a JSON number or a string.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Str(String),
    }

    let id = Option::<IdRepr>::deserialize(deserializer)?;
    Ok(id.map(|v| match v {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Str(s) => s,
    }))
}

// =============================================================================
// Normalized Entries
// =============================================================================

/// A flat (isbn, order, quantity, date) entry ready for a ledger insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// ISBN resolved from the line item.
    pub isbn: String,
    /// Order id the entry belongs to.
    pub order_id: String,
    /// Quantity for this entry.
    pub quantity: i32,
    /// Event date: order creation or cancellation time.
    pub occurred_at: DateTime<Utc>,
}

/// A flat refund entry; `refund_date` participates in the idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundEntry {
    /// ISBN resolved from the refunded line item.
    pub isbn: String,
    /// Order id the refund belongs to.
    pub order_id: String,
    /// Quantity refunded.
    pub quantity: i32,
    /// Refund creation time.
    pub refund_date: DateTime<Utc>,
}

/// Result of normalizing one payload: the usable entries plus a count of
/// line items dropped for having no resolvable ISBN.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    /// Entries with a resolvable ISBN.
    pub entries: Vec<T>,
    /// Line items skipped because neither barcode nor ISBN was present.
    pub skipped_missing_isbn: usize,
}

impl<T> Normalized<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            skipped_missing_isbn: 0,
        }
    }
}

impl LineItem {
    /// Resolve the ISBN for this line item, preferring the barcode field.
    #[must_use]
    pub fn resolve_isbn(&self) -> Option<&str> {
        let barcode = self.barcode.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let isbn = self.isbn.as_deref().map(str::trim).filter(|s| !s.is_empty());
        barcode.or(isbn)
    }
}

impl OrderPayload {
    /// The order id, falling back to the legacy `order_id` key.
    #[must_use]
    pub fn resolve_order_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.order_id.as_deref())
    }

    /// Normalize line items into ledger entries for presale/sales recording.
    ///
    /// Returns `None` if the order has no id (precondition failure: nothing
    /// can be keyed). Quantity defaults to 1 when absent. Items without a
    /// resolvable ISBN are skipped and counted, never fatal.
    #[must_use]
    pub fn line_entries(&self, now: DateTime<Utc>) -> Option<Normalized<LedgerEntry>> {
        let order_id = self.resolve_order_id()?;
        let occurred_at = self.created_at.unwrap_or(now);

        let mut out = Normalized::new();
        for item in &self.line_items {
            let Some(isbn) = item.resolve_isbn() else {
                out.skipped_missing_isbn += 1;
                continue;
            };
            out.entries.push(LedgerEntry {
                isbn: isbn.to_owned(),
                order_id: order_id.to_owned(),
                quantity: item.quantity.unwrap_or(1),
                occurred_at,
            });
        }
        Some(out)
    }

    /// Normalize line items into cancellation entries.
    ///
    /// Returns `None` if the order has no id or no line items. Entries
    /// require a resolvable ISBN and quantity > 0; anything else is skipped
    /// individually so one bad item cannot abort the order.
    #[must_use]
    pub fn cancellation_entries(&self, now: DateTime<Utc>) -> Option<Normalized<LedgerEntry>> {
        let order_id = self.resolve_order_id()?;
        if self.line_items.is_empty() {
            return None;
        }
        let cancelled_on = self.cancelled_at.unwrap_or(now);

        let mut out = Normalized::new();
        for item in &self.line_items {
            let Some(isbn) = item.resolve_isbn() else {
                out.skipped_missing_isbn += 1;
                continue;
            };
            let quantity = item.quantity.unwrap_or(0);
            if quantity <= 0 {
                continue;
            }
            out.entries.push(LedgerEntry {
                isbn: isbn.to_owned(),
                order_id: order_id.to_owned(),
                quantity,
                occurred_at: cancelled_on,
            });
        }
        Some(out)
    }

    /// Normalize refund sub-objects into refund entries.
    ///
    /// Returns `None` if the order has no id or carries no refunds. Each
    /// refund's `created_at` becomes the entry's `refund_date`, defaulting
    /// to `now`; refunded items need an ISBN and quantity > 0.
    #[must_use]
    pub fn refund_entries(&self, now: DateTime<Utc>) -> Option<Normalized<RefundEntry>> {
        let order_id = self.resolve_order_id()?;
        if self.refunds.is_empty() {
            return None;
        }

        let mut out = Normalized::new();
        for refund in &self.refunds {
            let refund_date = refund.created_at.unwrap_or(now);
            for item in &refund.refund_line_items {
                let Some(isbn) = item.line_item.resolve_isbn() else {
                    out.skipped_missing_isbn += 1;
                    continue;
                };
                let quantity = item.quantity.unwrap_or(0);
                if quantity <= 0 {
                    continue;
                }
                out.entries.push(RefundEntry {
                    isbn: isbn.to_owned(),
                    order_id: order_id.to_owned(),
                    quantity,
                    refund_date,
                });
            }
        }
        Some(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_order_id_numeric_or_string() {
        let numeric: OrderPayload = serde_json::from_str(r#"{"id": 450789469}"#).unwrap();
        assert_eq!(numeric.resolve_order_id(), Some("450789469"));

        let string: OrderPayload = serde_json::from_str(r#"{"id": "450789469"}"#).unwrap();
        assert_eq!(string.resolve_order_id(), Some("450789469"));

        let legacy: OrderPayload = serde_json::from_str(r#"{"order_id": 77}"#).unwrap();
        assert_eq!(legacy.resolve_order_id(), Some("77"));

        let none: OrderPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(none.resolve_order_id(), None);
    }

    #[test]
    fn test_resolve_isbn_prefers_barcode() {
        let item = LineItem {
            barcode: Some("9781111111111".to_string()),
            isbn: Some("9782222222222".to_string()),
            quantity: Some(1),
        };
        assert_eq!(item.resolve_isbn(), Some("9781111111111"));

        let blank_barcode = LineItem {
            barcode: Some("  ".to_string()),
            isbn: Some("9782222222222".to_string()),
            quantity: Some(1),
        };
        assert_eq!(blank_barcode.resolve_isbn(), Some("9782222222222"));

        let neither = LineItem::default();
        assert_eq!(neither.resolve_isbn(), None);
    }

    #[test]
    fn test_line_entries_skips_missing_isbn() {
        let order: OrderPayload = serde_json::from_str(
            r#"{
                "id": 1001,
                "created_at": "2024-05-01T00:00:00Z",
                "line_items": [
                    {"barcode": "9781111111111", "quantity": 2},
                    {"quantity": 3},
                    {"isbn": "9782222222222"}
                ]
            }"#,
        )
        .unwrap();

        let normalized = order.line_entries(now()).unwrap();
        assert_eq!(normalized.entries.len(), 2);
        assert_eq!(normalized.skipped_missing_isbn, 1);
        assert_eq!(normalized.entries[0].quantity, 2);
        // quantity defaults to 1 when absent
        assert_eq!(normalized.entries[1].quantity, 1);
        assert_eq!(normalized.entries[0].order_id, "1001");
    }

    #[test]
    fn test_line_entries_requires_order_id() {
        let order: OrderPayload =
            serde_json::from_str(r#"{"line_items": [{"barcode": "9781111111111"}]}"#).unwrap();
        assert!(order.line_entries(now()).is_none());
    }

    #[test]
    fn test_cancellation_entries_filter_nonpositive_quantity() {
        let order: OrderPayload = serde_json::from_str(
            r#"{
                "id": 1002,
                "cancelled_at": "2024-05-02T09:30:00Z",
                "line_items": [
                    {"barcode": "9781111111111", "quantity": 1},
                    {"barcode": "9782222222222", "quantity": 0},
                    {"barcode": "9783333333333"}
                ]
            }"#,
        )
        .unwrap();

        let normalized = order.cancellation_entries(now()).unwrap();
        assert_eq!(normalized.entries.len(), 1);
        assert_eq!(normalized.entries[0].isbn, "9781111111111");
        assert_eq!(
            normalized.entries[0].occurred_at,
            Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_cancellation_entries_precondition_failures() {
        let no_items: OrderPayload = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(no_items.cancellation_entries(now()).is_none());

        let no_id: OrderPayload =
            serde_json::from_str(r#"{"line_items": [{"barcode": "9781111111111"}]}"#).unwrap();
        assert!(no_id.cancellation_entries(now()).is_none());
    }

    #[test]
    fn test_refund_entries_two_line_items() {
        let order: OrderPayload = serde_json::from_str(
            r#"{
                "id": "o1",
                "refunds": [{
                    "created_at": "2024-05-03T10:00:00Z",
                    "refund_line_items": [
                        {"quantity": 1, "line_item": {"barcode": "111"}},
                        {"quantity": 2, "line_item": {"barcode": "222"}}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let normalized = order.refund_entries(now()).unwrap();
        assert_eq!(normalized.entries.len(), 2);
        assert_eq!(normalized.entries[0].isbn, "111");
        assert_eq!(normalized.entries[0].quantity, 1);
        assert_eq!(normalized.entries[1].isbn, "222");
        assert_eq!(normalized.entries[1].quantity, 2);
        assert_eq!(normalized.entries[0].order_id, "o1");
    }

    #[test]
    fn test_refund_entries_default_date_and_filters() {
        let order: OrderPayload = serde_json::from_str(
            r#"{
                "id": 5,
                "refunds": [{
                    "refund_line_items": [
                        {"quantity": 1, "line_item": {"barcode": "9781111111111"}},
                        {"quantity": 0, "line_item": {"barcode": "9782222222222"}},
                        {"quantity": 4, "line_item": {}}
                    ]
                }]
            }"#,
        )
        .unwrap();

        let normalized = order.refund_entries(now()).unwrap();
        assert_eq!(normalized.entries.len(), 1);
        assert_eq!(normalized.entries[0].refund_date, now());
        assert_eq!(normalized.skipped_missing_isbn, 1);
    }

    #[test]
    fn test_refund_entries_none_without_refunds() {
        let order: OrderPayload = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert!(order.refund_entries(now()).is_none());
    }
}
