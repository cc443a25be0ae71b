//! Symbol value object for ticker identifiers.
//!
//! Symbols compare and hash case-insensitively but preserve the casing the
//! caller supplied, so a widget subscribed as "brk.b" still displays its
//! ticker the way the user typed it.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted symbol length.
const MAX_SYMBOL_LEN: usize = 21;

/// Validation errors for ticker symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// The symbol string is empty.
    #[error("symbol cannot be empty")]
    Empty,

    /// The symbol exceeds the maximum length.
    #[error("symbol exceeds {MAX_SYMBOL_LEN} characters")]
    TooLong,

    /// The symbol contains characters outside the accepted set.
    #[error("symbol contains invalid characters")]
    InvalidCharacters,
}

/// A ticker symbol (equity, ETF, index, or crypto pair).
///
/// Examples: "AAPL", "MSFT", "BRK.B", "^GSPC", "BTC-USD".
///
/// Identity is case-insensitive: `Symbol::new("aapl") == Symbol::new("AAPL")`
/// and both hash to the same bucket, while `as_str` returns the original
/// casing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new symbol, preserving the caller's casing.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the symbol string as supplied.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Canonical case-folded form, used as a map key.
    #[must_use]
    pub fn key(&self) -> String {
        self.0.to_ascii_uppercase()
    }

    /// Validate the symbol for use in a provider request.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty, too long, or contains
    /// characters outside alphanumerics and `.-^=`.
    pub fn validate(&self) -> Result<(), SymbolError> {
        if self.0.is_empty() {
            return Err(SymbolError::Empty);
        }

        if self.0.len() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong);
        }

        let valid = self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(SymbolError::InvalidCharacters);
        }

        Ok(())
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            byte.to_ascii_uppercase().hash(state);
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_preserves_casing() {
        let s = Symbol::new("aapl");
        assert_eq!(s.as_str(), "aapl");
        assert_eq!(s.key(), "AAPL");
    }

    #[test]
    fn symbol_identity_is_case_insensitive() {
        assert_eq!(Symbol::new("aapl"), Symbol::new("AAPL"));
        assert_eq!(Symbol::new("Msft"), Symbol::new("mSFT"));
        assert_ne!(Symbol::new("AAPL"), Symbol::new("MSFT"));
    }

    #[test]
    fn symbol_hash_matches_identity() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Symbol::new("AAPL"));
        set.insert(Symbol::new("aapl"));
        set.insert(Symbol::new("MSFT"));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn symbol_validate_valid() {
        assert!(Symbol::new("AAPL").validate().is_ok());
        assert!(Symbol::new("BRK.B").validate().is_ok());
        assert!(Symbol::new("^GSPC").validate().is_ok());
        assert!(Symbol::new("BTC-USD").validate().is_ok());
        assert!(Symbol::new("EURUSD=X").validate().is_ok());
    }

    #[test]
    fn symbol_validate_empty() {
        assert_eq!(Symbol::new("").validate(), Err(SymbolError::Empty));
    }

    #[test]
    fn symbol_validate_too_long() {
        let s = Symbol::new("A".repeat(MAX_SYMBOL_LEN + 1));
        assert_eq!(s.validate(), Err(SymbolError::TooLong));
    }

    #[test]
    fn symbol_validate_invalid_chars() {
        assert_eq!(
            Symbol::new("AA PL").validate(),
            Err(SymbolError::InvalidCharacters)
        );
        assert_eq!(
            Symbol::new("AAPL!").validate(),
            Err(SymbolError::InvalidCharacters)
        );
    }

    #[test]
    fn symbol_display_uses_original_casing() {
        assert_eq!(format!("{}", Symbol::new("Crwv")), "Crwv");
    }

    #[test]
    fn symbol_serde_roundtrip() {
        let s = Symbol::new("AAPL");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"AAPL\"");

        let parsed: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn symbol_from_conversions() {
        let s1: Symbol = "AAPL".into();
        assert_eq!(s1.as_str(), "AAPL");

        let s2: Symbol = String::from("msft").into();
        assert_eq!(s2.key(), "MSFT");
    }
}
