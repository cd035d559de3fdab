//! Market data structures mirrored from the contract

use crate::outcome::Outcome;
use crate::session::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single voter's stake in a market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub side: Outcome,
    pub quantity: u64,
}

/// A binary prediction market as stored by the contract.
///
/// Read-only mirror: the client never patches these fields, it only
/// replaces whole markets on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Unique identifier assigned by the contract
    pub id: String,

    /// Account that created the market
    pub creator: Address,

    /// Human-readable question
    pub question: String,

    /// Outstanding YES shares
    pub num_yes: u64,

    /// Outstanding NO shares
    pub num_no: u64,

    /// LMSR liquidity parameter `b`
    pub liquidity: f64,

    #[serde(default)]
    pub resolved: bool,

    /// Only set once `resolved` is true
    #[serde(default)]
    pub outcome: Option<Outcome>,

    #[serde(default)]
    pub voters: HashMap<Address, Vote>,
}

impl Market {
    pub fn total_votes(&self) -> u64 {
        self.num_yes.saturating_add(self.num_no)
    }

    /// YES share of all votes as a percentage (0 when nobody voted)
    pub fn yes_share(&self) -> f64 {
        self.share(self.num_yes)
    }

    /// NO share of all votes as a percentage (0 when nobody voted)
    pub fn no_share(&self) -> f64 {
        self.share(self.num_no)
    }

    fn share(&self, count: u64) -> f64 {
        let total = self.total_votes();
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    }

    /// The resolved outcome; `None` while the market is open
    pub fn winning_outcome(&self) -> Option<Outcome> {
        if self.resolved {
            self.outcome
        } else {
            None
        }
    }

    /// Authoritative vote of `address`, if any
    pub fn vote_of(&self, address: &Address) -> Option<&Vote> {
        self.voters.get(address)
    }
}

/// Per-share prices returned by `get_cost`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostQuote {
    pub yes: f64,
    pub no: f64,
}

impl CostQuote {
    pub fn per_share(&self, side: Outcome) -> f64 {
        match side {
            Outcome::Yes => self.yes,
            Outcome::No => self.no,
        }
    }

    /// Displayed total for buying `quantity` shares of `side`.
    ///
    /// The only arithmetic the client performs; prices come from the contract.
    pub fn total(&self, side: Outcome, quantity: u64) -> f64 {
        self.per_share(side) * quantity as f64
    }
}

impl From<(f64, f64)> for CostQuote {
    fn from((yes, no): (f64, f64)) -> Self {
        Self { yes, no }
    }
}
