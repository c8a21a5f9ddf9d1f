use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::assets::{AssetRepositoryTrait, NewAsset, PriceMode, PriceStatus};
use crate::quotes::{PriceUpdateService, Quote, QuoteError, QuoteProviderTrait};
use crate::store::MemoryStore;

struct ScriptedProvider {
    quotes: HashMap<String, Decimal>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    fn new(quotes: &[(&str, Decimal)]) -> Self {
        Self {
            quotes: quotes
                .iter()
                .map(|(ticker, price)| (ticker.to_string(), *price))
                .collect(),
            delay: None,
        }
    }
}

#[async_trait]
impl QuoteProviderTrait for ScriptedProvider {
    async fn latest_quote(&self, ticker: &str) -> Result<Quote, QuoteError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.quotes
            .get(ticker)
            .map(|price| Quote {
                ticker: ticker.to_string(),
                price: *price,
            })
            .ok_or_else(|| QuoteError::UnknownTicker(ticker.to_string()))
    }
}

/// Echoes quotes under a canonicalized (lowercased) ticker, the way
/// some upstream feeds do.
struct CanonicalizingProvider {
    price: Decimal,
}

#[async_trait]
impl QuoteProviderTrait for CanonicalizingProvider {
    async fn latest_quote(&self, ticker: &str) -> Result<Quote, QuoteError> {
        Ok(Quote {
            ticker: ticker.to_lowercase(),
            price: self.price,
        })
    }
}

async fn seed_asset(store: &MemoryStore, name: &str, ticker: Option<&str>) -> String {
    store
        .create_asset(NewAsset {
            name: name.to_string(),
            ticker: ticker.map(|t| t.to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn failing_ticker_is_isolated_from_the_batch() {
    let store = Arc::new(MemoryStore::new());
    let apple = seed_asset(&store, "Apple", Some("AAPL")).await;
    let broken = seed_asset(&store, "Broken", Some("BADTICKER")).await;

    let provider = Arc::new(ScriptedProvider::new(&[("AAPL", dec!(187.30))]));
    let service = PriceUpdateService::new(store.clone(), provider);

    let summary = service.refresh_prices().await.unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].ticker, "BADTICKER");
    assert_eq!(summary.prices.len(), 1);
    assert_eq!(summary.prices[0].price, dec!(187.30));

    let apple = store.get_asset(&apple).unwrap();
    assert_eq!(apple.current_price, Some(dec!(187.30)));
    assert_eq!(apple.price_status, PriceStatus::Ok);

    // The failing asset keeps its old (absent) price and turns ERROR.
    let broken = store.get_asset(&broken).unwrap();
    assert_eq!(broken.current_price, None);
    assert_eq!(broken.price_status, PriceStatus::Error);
}

#[tokio::test]
async fn manual_and_tickerless_assets_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    seed_asset(&store, "No Ticker Fund", None).await;
    let manual = store
        .create_asset(NewAsset {
            name: "Hand Priced".to_string(),
            ticker: Some("HAND".to_string()),
            price_mode: Some(PriceMode::Manual),
            current_price: Some(dec!(42)),
            ..Default::default()
        })
        .await
        .unwrap();

    let provider = Arc::new(ScriptedProvider::new(&[("HAND", dec!(99))]));
    let service = PriceUpdateService::new(store.clone(), provider);

    let summary = service.refresh_prices().await.unwrap();
    assert_eq!(summary.updated, 0);
    assert!(summary.errors.is_empty());

    let manual = store.get_asset(&manual.id).unwrap();
    assert_eq!(manual.current_price, Some(dec!(42)));
}

#[tokio::test]
async fn slow_provider_times_out_per_ticker() {
    let store = Arc::new(MemoryStore::new());
    let asset = seed_asset(&store, "Apple", Some("AAPL")).await;

    let mut provider = ScriptedProvider::new(&[("AAPL", dec!(187.30))]);
    provider.delay = Some(Duration::from_secs(5));
    let service = PriceUpdateService::new(store.clone(), Arc::new(provider))
        .with_timeout(Duration::from_millis(20));

    let summary = service.refresh_prices().await.unwrap();
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].message.contains("timed out"));
    assert_eq!(store.get_asset(&asset).unwrap().price_status, PriceStatus::Error);
}

#[tokio::test]
async fn provider_echoing_canonicalized_ticker_still_updates() {
    let store = Arc::new(MemoryStore::new());
    let asset = seed_asset(&store, "Apple", Some("AAPL")).await;

    let provider = Arc::new(CanonicalizingProvider { price: dec!(187.30) });
    let service = PriceUpdateService::new(store.clone(), provider);

    let summary = service.refresh_prices().await.unwrap();
    assert_eq!(summary.updated, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(summary.prices[0].ticker, "AAPL");

    let apple = store.get_asset(&asset).unwrap();
    assert_eq!(apple.current_price, Some(dec!(187.30)));
    assert_eq!(apple.price_status, PriceStatus::Ok);
}

#[tokio::test]
async fn shared_ticker_updates_every_asset_once() {
    let store = Arc::new(MemoryStore::new());
    let first = seed_asset(&store, "Apple ETF Line A", Some("AAPL")).await;
    let second = seed_asset(&store, "Apple ETF Line B", Some("AAPL")).await;

    let provider = Arc::new(ScriptedProvider::new(&[("AAPL", dec!(187.30))]));
    let service = PriceUpdateService::new(store.clone(), provider);

    let summary = service.refresh_prices().await.unwrap();
    assert_eq!(summary.updated, 2);
    for id in [first, second] {
        assert_eq!(store.get_asset(&id).unwrap().current_price, Some(dec!(187.30)));
    }
}
