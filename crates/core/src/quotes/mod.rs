//! Quotes module - market price refresh through an external provider.

mod price_update_service;
mod quotes_model;
mod quotes_traits;

#[cfg(test)]
mod price_update_service_tests;

pub use price_update_service::PriceUpdateService;
pub use quotes_model::{PriceUpdateError, PriceUpdateSummary, Quote, QuoteError, TickerPrice};
pub use quotes_traits::QuoteProviderTrait;
