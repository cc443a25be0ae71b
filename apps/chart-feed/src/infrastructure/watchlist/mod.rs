//! Persisted Watchlist Store
//!
//! The desktop shell keeps the user's tickers in a small JSON file (a
//! plain array of symbol strings). The feed core only needs it to seed
//! initial subscriptions at startup; chrome preferences live elsewhere.
//! Missing or corrupt files load as an empty list so a damaged settings
//! file never blocks startup.

use std::io;
use std::path::{Path, PathBuf};

use crate::domain::symbol::Symbol;

/// Loads and saves the persisted symbol list.
#[derive(Debug, Clone)]
pub struct WatchlistStore {
    path: PathBuf,
}

impl WatchlistStore {
    /// Create a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the watchlist.
    ///
    /// Invalid entries are skipped and case-insensitive duplicates
    /// collapsed, keeping the first spelling. A missing or unreadable file
    /// is an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<Symbol> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read watchlist");
                return Vec::new();
            }
        };

        let entries: Vec<String> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt watchlist file");
                return Vec::new();
            }
        };

        let mut seen = std::collections::HashSet::new();
        let mut symbols = Vec::new();
        for entry in entries {
            let symbol = Symbol::new(entry);
            if let Err(e) = symbol.validate() {
                tracing::warn!(symbol = %symbol, error = %e, "Skipping invalid watchlist entry");
                continue;
            }
            if seen.insert(symbol.key()) {
                symbols.push(symbol);
            }
        }
        symbols
    }

    /// Save the watchlist, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on failure.
    pub fn save(&self, symbols: &[Symbol]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        let json = serde_json::to_string_pretty(&entries).map_err(io::Error::other)?;
        std::fs::write(&self.path, json)
    }
}
