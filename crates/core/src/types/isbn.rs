//! ISBN-13 identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Isbn`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum IsbnError {
    /// The input string is empty.
    #[error("ISBN cannot be empty")]
    Empty,
    /// The input is not exactly 13 characters long.
    #[error("ISBN must be exactly 13 digits (got {len})")]
    WrongLength {
        /// Actual length of the input.
        len: usize,
    },
    /// The input contains a non-digit character.
    #[error("ISBN must contain only digits")]
    NonDigit,
}

/// A 13-digit ISBN, the natural business key for a title.
///
/// The ledger tables store ISBNs as plain text so that malformed catalog
/// values survive long enough to be reported by the anomaly scanner. This
/// type is used wherever a *well-formed* ISBN is required: operator input
/// on the release command and validation checks.
///
/// ## Examples
///
/// ```
/// use folio_core::Isbn;
///
/// assert!(Isbn::parse("9781234567897").is_ok());
/// assert!(Isbn::parse("123").is_err());         // too short
/// assert!(Isbn::parse("97812345678X7").is_err()); // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Isbn(String);

impl Isbn {
    /// Length of an ISBN-13.
    pub const LENGTH: usize = 13;

    /// Parse an `Isbn` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not exactly 13 characters,
    /// or contains non-digit characters.
    pub fn parse(s: &str) -> Result<Self, IsbnError> {
        if s.is_empty() {
            return Err(IsbnError::Empty);
        }
        if s.len() != Self::LENGTH {
            return Err(IsbnError::WrongLength { len: s.len() });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IsbnError::NonDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns `true` if `s` has the 13-digit-numeric shape.
    ///
    /// Shape check only; no checksum validation, matching what the catalog
    /// audit needs (the anomaly scanner flags anything that fails this).
    #[must_use]
    pub fn is_well_formed(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// Returns the ISBN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Isbn` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
