//! Engine assembly.
//!
//! Wires the in-process store and every service behind one struct. The
//! quote provider and workbook parser are the only external seams and
//! are injected by the caller; nothing here reaches the network or the
//! filesystem on its own.

use std::sync::Arc;

use crate::accounts::{AccountService, AccountServiceTrait};
use crate::assets::{AssetService, AssetServiceTrait};
use crate::export::ExportService;
use crate::import::{ImportService, WorkbookParserTrait};
use crate::income::{IncomeService, IncomeServiceTrait};
use crate::ledger::{LedgerService, LedgerServiceTrait};
use crate::portfolio::positions::{PositionService, PositionServiceTrait};
use crate::portfolio::valuation::{ValuationService, ValuationServiceTrait};
use crate::quotes::{PriceUpdateService, QuoteProviderTrait};
use crate::settings::{SettingsService, SettingsServiceTrait};
use crate::store::MemoryStore;

/// Fully wired portfolio engine.
pub struct PortfolioEngine {
    pub settings: Arc<dyn SettingsServiceTrait>,
    pub accounts: Arc<dyn AccountServiceTrait>,
    pub assets: Arc<dyn AssetServiceTrait>,
    pub ledger: Arc<dyn LedgerServiceTrait>,
    pub positions: Arc<dyn PositionServiceTrait>,
    pub valuation: Arc<dyn ValuationServiceTrait>,
    pub income: Arc<dyn IncomeServiceTrait>,
    pub price_updates: Arc<PriceUpdateService>,
    pub import: Arc<ImportService>,
    pub export: Arc<ExportService>,
}

impl PortfolioEngine {
    pub fn new(
        quote_provider: Arc<dyn QuoteProviderTrait>,
        workbook_parser: Arc<dyn WorkbookParserTrait>,
    ) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), quote_provider, workbook_parser)
    }

    pub fn with_store(
        store: Arc<MemoryStore>,
        quote_provider: Arc<dyn QuoteProviderTrait>,
        workbook_parser: Arc<dyn WorkbookParserTrait>,
    ) -> Self {
        let settings: Arc<dyn SettingsServiceTrait> =
            Arc::new(SettingsService::new(store.clone()));
        let positions: Arc<dyn PositionServiceTrait> = Arc::new(PositionService::new(
            store.clone(),
            settings.clone(),
        ));
        let accounts: Arc<dyn AccountServiceTrait> = Arc::new(AccountService::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let assets: Arc<dyn AssetServiceTrait> = Arc::new(AssetService::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let ledger: Arc<dyn LedgerServiceTrait> = Arc::new(LedgerService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            positions.clone(),
            settings.clone(),
        ));
        let income: Arc<dyn IncomeServiceTrait> = Arc::new(IncomeService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            positions.clone(),
            settings.clone(),
        ));
        let valuation: Arc<dyn ValuationServiceTrait> = Arc::new(ValuationService::new(
            positions.clone(),
            store.clone(),
            store.clone(),
            settings.clone(),
        ));
        let price_updates = Arc::new(PriceUpdateService::new(store.clone(), quote_provider));
        let import = Arc::new(ImportService::new(
            workbook_parser,
            ledger.clone(),
            income.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            settings.clone(),
        ));
        let export = Arc::new(ExportService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        ));

        Self {
            settings,
            accounts,
            assets,
            ledger,
            positions,
            valuation,
            income,
            price_updates,
            import,
            export,
        }
    }
}
