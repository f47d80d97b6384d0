//! Title lifecycle status.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a title in the preorder ledger.
///
/// The presence of a row in `releases_log` is the authoritative "has this
/// title been released" flag. All status reads derive from that row through
/// this enum rather than re-checking the preorder flags in multiple places;
/// flag drift between the catalog sync and the release finalizer is what
/// the scanner's "Tagged preorder after release" anomaly catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    /// Under preorder management; no release record exists.
    Preorder,
    /// Released; a release record exists and the transition is terminal.
    Released,
}

impl TitleStatus {
    /// Derive the status from the presence of a release record.
    #[must_use]
    pub const fn from_release_record(released: bool) -> Self {
        if released { Self::Released } else { Self::Preorder }
    }

    /// Returns `true` if the title has been released.
    #[must_use]
    pub const fn is_released(self) -> bool {
        matches!(self, Self::Released)
    }
}

impl fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preorder => write!(f, "preorder"),
            Self::Released => write!(f, "released"),
        }
    }
}
