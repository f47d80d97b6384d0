//! Reconciliation services layered over the repositories.

pub mod anomaly_scan;
pub mod readiness;

pub use anomaly_scan::AnomalyScanner;
pub use readiness::{ReadinessAnalyzer, ReadyTitle};
