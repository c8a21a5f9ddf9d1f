//! Portfolio module - derived positions, cost basis, and valuation.

pub mod positions;
pub mod valuation;
