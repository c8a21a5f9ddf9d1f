use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};

use crate::assets::{Asset, AssetRepositoryTrait, PriceMode};
use crate::constants::{QUOTE_BATCH_SIZE, QUOTE_TIMEOUT_SECS};
use crate::quotes::{
    PriceUpdateError, PriceUpdateSummary, Quote, QuoteError, QuoteProviderTrait, TickerPrice,
};
use crate::Result;

/// Refreshes prices for all AUTO-mode assets with tickers.
///
/// Requests fan out with bounded parallelism and a per-ticker timeout;
/// a failing ticker becomes one `errors[]` entry and never blocks the
/// rest of the batch.
pub struct PriceUpdateService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    provider: Arc<dyn QuoteProviderTrait>,
    quote_timeout: Duration,
    batch_size: usize,
}

impl PriceUpdateService {
    pub fn new(
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        provider: Arc<dyn QuoteProviderTrait>,
    ) -> Self {
        Self {
            asset_repository,
            provider,
            quote_timeout: Duration::from_secs(QUOTE_TIMEOUT_SECS),
            batch_size: QUOTE_BATCH_SIZE,
        }
    }

    pub fn with_timeout(mut self, quote_timeout: Duration) -> Self {
        self.quote_timeout = quote_timeout;
        self
    }

    // The requested ticker rides along with the quote; providers are
    // free to echo a canonicalized ticker and results are still keyed
    // by the string that was asked for.
    async fn fetch_one(&self, ticker: String) -> std::result::Result<(String, Quote), (String, String)> {
        match tokio::time::timeout(self.quote_timeout, self.provider.latest_quote(&ticker)).await {
            Ok(Ok(quote)) => Ok((ticker, quote)),
            Ok(Err(e)) => Err((ticker, e.to_string())),
            Err(_) => Err((
                ticker,
                QuoteError::Timeout(self.quote_timeout.as_secs()).to_string(),
            )),
        }
    }

    /// Refreshes every refreshable asset. Assets without a ticker are
    /// skipped and never counted as errors.
    pub async fn refresh_prices(&self) -> Result<PriceUpdateSummary> {
        // Distinct tickers, each mapped to the assets quoting it.
        let mut by_ticker: BTreeMap<String, Vec<Asset>> = BTreeMap::new();
        for asset in self.asset_repository.list_assets()? {
            if asset.price_mode != PriceMode::Auto {
                continue;
            }
            if let Some(ticker) = asset.ticker.clone() {
                by_ticker.entry(ticker).or_default().push(asset);
            }
        }

        let mut summary = PriceUpdateSummary {
            updated: 0,
            errors: Vec::new(),
            prices: Vec::new(),
        };
        if by_ticker.is_empty() {
            debug!("No refreshable assets; skipping price update");
            return Ok(summary);
        }

        let tickers: Vec<String> = by_ticker.keys().cloned().collect();
        let mut results = Vec::with_capacity(tickers.len());
        for chunk in tickers.chunks(self.batch_size) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|ticker| self.fetch_one(ticker.clone()))
                .collect();
            results.extend(futures::future::join_all(futures).await);
        }

        for result in results {
            match result {
                Ok((ticker, quote)) => {
                    let now = Utc::now();
                    for asset in &by_ticker[&ticker] {
                        self.asset_repository
                            .apply_quote(&asset.id, quote.price, now)
                            .await?;
                        summary.updated += 1;
                        summary.prices.push(TickerPrice {
                            ticker: ticker.clone(),
                            name: asset.name.clone(),
                            price: quote.price,
                        });
                    }
                }
                Err((ticker, message)) => {
                    warn!("Quote fetch failed for {ticker}: {message}");
                    for asset in &by_ticker[&ticker] {
                        self.asset_repository.mark_price_error(&asset.id).await?;
                    }
                    summary.errors.push(PriceUpdateError { ticker, message });
                }
            }
        }

        debug!(
            "Price refresh finished: {} updated, {} failed",
            summary.updated,
            summary.errors.len()
        );
        Ok(summary)
    }
}
