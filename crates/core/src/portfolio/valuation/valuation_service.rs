use std::sync::Arc;

use num_traits::Zero;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::accounts::AccountRepositoryTrait;
use crate::assets::{AssetRepositoryTrait, PriceStatus};
use crate::portfolio::positions::PositionServiceTrait;
use crate::portfolio::valuation::{AccountBalance, PortfolioValuation, PositionValuation};
use crate::settings::SettingsServiceTrait;
use crate::utils::{round_money, round_qty};
use crate::Result;

/// Trait defining the contract for valuation operations.
pub trait ValuationServiceTrait: Send + Sync {
    /// Values all open positions at their latest known prices. Assets
    /// whose price is stale or missing are flagged, never skipped; the
    /// valuation itself is never aborted by them.
    fn valuate(&self) -> Result<PortfolioValuation>;
}

pub struct ValuationService {
    position_service: Arc<dyn PositionServiceTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
}

impl ValuationService {
    pub fn new(
        position_service: Arc<dyn PositionServiceTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            position_service,
            asset_repository,
            account_repository,
            settings_service,
        }
    }
}

fn pct(part: Decimal, whole: Decimal) -> Decimal {
    if whole > Decimal::zero() {
        (part / whole * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    }
}

impl ValuationServiceTrait for ValuationService {
    fn valuate(&self) -> Result<PortfolioValuation> {
        let settings = self.settings_service.get_settings()?;
        let money = settings.rounding_money;
        let qty = settings.rounding_qty;

        let mut positions = Vec::new();
        let mut total_market_value = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;
        let mut has_stale_prices = false;

        for position in self.position_service.positions()? {
            let asset = self.asset_repository.get_asset(&position.asset_id)?;
            let stale = asset.price_status != PriceStatus::Ok || asset.current_price.is_none();
            has_stale_prices = has_stale_prices || stale;

            let quantity = round_qty(position.quantity, qty);
            let cost_total = round_money(position.quantity * position.average_cost, money);
            let market_value = match asset.current_price {
                Some(price) => round_money(position.quantity * price, money),
                None => Decimal::ZERO,
            };
            let unrealized_gain = market_value - cost_total;

            total_market_value += market_value;
            total_cost += cost_total;

            positions.push(PositionValuation {
                asset_id: asset.id,
                asset_name: asset.name,
                ticker: asset.ticker,
                asset_type: asset.asset_type,
                account_id: position.account_id,
                quantity,
                average_cost: round_money(position.average_cost, money),
                cost_total,
                current_price: asset.current_price,
                market_value,
                unrealized_gain,
                unrealized_gain_pct: pct(unrealized_gain, cost_total),
                weight_pct: Decimal::ZERO,
                stale,
            });
        }

        for position in &mut positions {
            position.weight_pct = pct(position.market_value, total_market_value);
        }
        positions.sort_by(|a, b| b.market_value.cmp(&a.market_value));

        let mut accounts = Vec::new();
        let mut total_cash = Decimal::ZERO;
        for account in self.account_repository.list_accounts()? {
            if !account.balance.is_zero() {
                total_cash += account.balance;
                accounts.push(AccountBalance {
                    account_id: account.id,
                    account_name: account.name,
                    account_type: account.account_type,
                    balance: round_money(account.balance, money),
                });
            }
        }

        let total_unrealized_gain = total_market_value - total_cost;
        Ok(PortfolioValuation {
            total_market_value: round_money(total_market_value, money),
            total_cost: round_money(total_cost, money),
            total_unrealized_gain: round_money(total_unrealized_gain, money),
            total_cash: round_money(total_cash, money),
            grand_total: round_money(total_market_value + total_cash, money),
            has_stale_prices,
            positions,
            accounts,
        })
    }
}
