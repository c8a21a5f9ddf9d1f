//! Valuation - positions combined with latest known prices.

mod valuation_model;
mod valuation_service;


pub use valuation_model::{AccountBalance, PortfolioValuation, PositionValuation};
pub use valuation_service::{ValuationService, ValuationServiceTrait};
