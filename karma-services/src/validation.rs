//! Local input checks run before any contract call

use karma_core::{KarmaError, KarmaResult};

pub fn require_bio(bio: &str) -> KarmaResult<&str> {
    non_blank(bio, "Please fill in your bio")
}

pub fn require_question(question: &str) -> KarmaResult<&str> {
    non_blank(question, "Please enter a question")
}

pub fn require_market_id(market_id: &str) -> KarmaResult<&str> {
    non_blank(market_id, "Market id is required")
}

fn non_blank<'a>(value: &'a str, message: &str) -> KarmaResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(KarmaError::validation(message))
    } else {
        Ok(trimmed)
    }
}

/// Share quantities are positive integers
pub fn require_quantity(quantity: u64) -> KarmaResult<u64> {
    if quantity == 0 {
        Err(KarmaError::validation("Please enter a valid quantity"))
    } else {
        Ok(quantity)
    }
}

pub fn require_liquidity(liquidity: f64) -> KarmaResult<f64> {
    positive(liquidity, "Please enter a valid liquidity amount")
}

pub fn require_amount(amount: f64) -> KarmaResult<f64> {
    positive(amount, "Please enter a valid deposit amount")
}

fn positive(value: f64, message: &str) -> KarmaResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(KarmaError::validation(message))
    }
}
