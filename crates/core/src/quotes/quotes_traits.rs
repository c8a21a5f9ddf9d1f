use crate::quotes::{Quote, QuoteError};
use async_trait::async_trait;

/// External quote provider. The engine never fetches prices itself; a
/// provider implementation is injected at assembly time.
#[async_trait]
pub trait QuoteProviderTrait: Send + Sync {
    async fn latest_quote(&self, ticker: &str) -> Result<Quote, QuoteError>;
}
