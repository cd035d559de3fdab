//! Optimistic overlay
//!
//! Short-lived record of votes this client just submitted, consulted before
//! the mirrored `voters` map until the next refresh lands.

use karma_core::{Address, Outcome};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Key of an overlay entry
pub type OverlayKey = (String, Address);

/// A vote submitted locally but not yet confirmed by a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub market_id: String,
    pub address: Address,
    pub side: Outcome,
}

#[derive(Debug, Default)]
pub struct OptimisticOverlay {
    entries: RwLock<HashMap<OverlayKey, Outcome>>,
}

impl OptimisticOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the entry for `(market_id, address)`
    pub fn record(&self, entry: OverlayEntry) {
        self.entries
            .write()
            .insert((entry.market_id, entry.address), entry.side);
    }

    pub fn get(&self, market_id: &str, address: &Address) -> Option<Outcome> {
        self.entries
            .read()
            .get(&(market_id.to_string(), address.clone()))
            .copied()
    }

    /// Drop every entry; returns how many were discarded
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
