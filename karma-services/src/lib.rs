//! Service layer for the Karma prediction market client
//!
//! Holds the in-memory market/user store, the optimistic vote overlay and
//! the orchestrators that turn user actions into contract calls.

pub mod client;
pub mod market_store;
pub mod overlay;
pub mod validation;

pub use client::KarmaClient;
pub use market_store::{MarketStore, RefreshReport, StoreStats};
pub use overlay::{OptimisticOverlay, OverlayEntry};
