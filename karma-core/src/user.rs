//! User profile and position structures

use crate::market::Market;
use crate::outcome::Outcome;
use crate::session::Address;
use serde::{Deserialize, Serialize};

/// A registered user as stored by the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Address,

    #[serde(default)]
    pub bio: String,

    pub balance: f64,

    /// Ids of every market this user voted in; only grows
    #[serde(default)]
    pub history: Vec<String>,
}

/// A user's stake in one market, joined from the mirrored state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub market_id: String,

    pub question: String,

    pub side: Outcome,

    pub quantity: u64,

    pub resolved: bool,

    /// `Some(true)` if the market resolved in this position's favour
    pub won: Option<bool>,
}

impl Position {
    /// Build a position for `address` from a market's voter map
    pub fn from_market(market: &Market, address: &Address) -> Option<Self> {
        let vote = market.vote_of(address)?;
        Some(Self {
            market_id: market.id.clone(),
            question: market.question.clone(),
            side: vote.side,
            quantity: vote.quantity,
            resolved: market.resolved,
            won: market.winning_outcome().map(|outcome| outcome == vote.side),
        })
    }
}
