//! Core types for the Karma prediction market client
//!
//! This crate defines the shared data structures mirrored from the Karma
//! contract, the client error taxonomy, wallet account normalization and
//! the response envelope decoder. It performs no I/O.

pub mod envelope;
pub mod error;
pub mod market;
pub mod outcome;
pub mod session;
pub mod user;

pub use envelope::{decode, decode_unit, DecodedResult};
pub use error::{KarmaError, KarmaResult};
pub use market::{CostQuote, Market, Vote};
pub use outcome::Outcome;
pub use session::{normalize_account, Address, ConnectionState, ConnectionStatus, WalletAccount};
pub use user::{Position, User};
