//! Per-symbol subscription reference counting.
//!
//! Many widgets may watch the same ticker (a tray preview and a detail
//! window, say). The ledger tracks handle-to-symbol ownership and a
//! refcount per symbol so the registry knows exactly when a symbol gains
//! its first subscriber (start polling) and loses its last one (stop
//! polling). The ledger itself is plain state; locking is the caller's
//! concern.

use std::collections::HashMap;

use crate::domain::symbol::Symbol;

/// Identifier issued per subscription, used to unsubscribe.
pub type SubscriptionId = u64;

/// Tracks live subscriptions and per-symbol reference counts.
///
/// Symbols are keyed by their case-folded form, so "aapl" and "AAPL"
/// share one count.
#[derive(Debug, Default)]
pub struct SubscriptionLedger {
    next_id: SubscriptionId,
    /// Map from subscription id to the folded symbol key it holds.
    owners: HashMap<SubscriptionId, String>,
    /// Map from folded symbol key to live subscription count.
    refcounts: HashMap<String, usize>,
}

impl SubscriptionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription for `symbol`.
    ///
    /// Returns the issued id and whether this was the symbol's first
    /// subscription (refcount went 0 to 1).
    pub fn subscribe(&mut self, symbol: &Symbol) -> (SubscriptionId, bool) {
        let key = symbol.key();

        let id = self.next_id;
        self.next_id += 1;
        self.owners.insert(id, key.clone());

        let refcount = self.refcounts.entry(key).or_insert(0);
        *refcount += 1;

        (id, *refcount == 1)
    }

    /// Release a subscription by id.
    ///
    /// Returns the folded symbol key and whether this was the symbol's last
    /// subscription (refcount went 1 to 0), or `None` for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<(String, bool)> {
        let key = self.owners.remove(&id)?;

        let mut last = false;
        if let Some(refcount) = self.refcounts.get_mut(&key) {
            *refcount = refcount.saturating_sub(1);
            if *refcount == 0 {
                self.refcounts.remove(&key);
                last = true;
            }
        }

        Some((key, last))
    }

    /// Live subscription count for a symbol.
    #[must_use]
    pub fn subscriber_count(&self, symbol: &Symbol) -> usize {
        self.refcounts.get(&symbol.key()).copied().unwrap_or(0)
    }

    /// Number of symbols with at least one subscriber.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.refcounts.len()
    }

    /// Total live subscriptions across all symbols.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.owners.len()
    }
}
