//! Weighted-average-cost replay.
//!
//! Replays an ordered transaction history into running (quantity, WAC)
//! state per asset+account. Pure: callers supply the ordering and the
//! gift cost policy; no store access happens here.

use std::collections::HashMap;

use num_traits::Zero;
use rust_decimal::Decimal;

use crate::ledger::{LedgerError, Transaction, TransactionType};
use crate::portfolio::positions::{Position, PositionKey, RealizedGain};
use crate::settings::GiftCostMode;

#[derive(Debug, Clone, Default)]
struct Holding {
    quantity: Decimal,
    average_cost: Decimal,
}

/// Running replay state. Feed transactions in ledger order via `apply`.
#[derive(Debug, Clone)]
pub struct ReplayState {
    gift_cost_mode: GiftCostMode,
    holdings: HashMap<PositionKey, Holding>,
    realized_gains: Vec<RealizedGain>,
}

/// Result of a full replay: open positions (quantity > 0) and the
/// realized-gain record of every SELL encountered.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub positions: Vec<Position>,
    pub realized_gains: Vec<RealizedGain>,
}

impl ReplayState {
    pub fn new(gift_cost_mode: GiftCostMode) -> Self {
        ReplayState {
            gift_cost_mode,
            holdings: HashMap::new(),
            realized_gains: Vec::new(),
        }
    }

    /// Current quantity held for a key (zero when absent).
    pub fn quantity(&self, key: &PositionKey) -> Decimal {
        self.holdings
            .get(key)
            .map(|h| h.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Applies one transaction. Returns the realized-gain record for a
    /// SELL, `None` for acquisitions.
    ///
    /// A SELL exceeding the held quantity fails with
    /// `InsufficientPosition` and leaves the state untouched.
    pub fn apply(&mut self, tx: &Transaction) -> Result<Option<RealizedGain>, LedgerError> {
        if tx.quantity <= Decimal::zero() {
            return Err(LedgerError::InvalidData(format!(
                "transaction {} has non-positive quantity {}",
                tx.id, tx.quantity
            )));
        }
        let key = PositionKey::new(&tx.asset_id, &tx.account_id);

        match tx.tx_type {
            TransactionType::Buy => {
                let price = tx.price.ok_or_else(|| {
                    LedgerError::InvalidData(format!("BUY {} has no price", tx.id))
                })?;
                let incoming_cost = tx.quantity * price + tx.commission + tx.tax;
                self.acquire(key, tx.quantity, incoming_cost);
                Ok(None)
            }
            TransactionType::Gift => {
                let incoming_cost = match self.gift_cost_mode {
                    GiftCostMode::Zero => Decimal::ZERO,
                    GiftCostMode::Market => tx.quantity * tx.price.unwrap_or(Decimal::ZERO),
                };
                self.acquire(key, tx.quantity, incoming_cost);
                Ok(None)
            }
            TransactionType::Sell => {
                let price = tx.price.ok_or_else(|| {
                    LedgerError::InvalidData(format!("SELL {} has no price", tx.id))
                })?;
                let holding = self.holdings.entry(key).or_default();
                if tx.quantity > holding.quantity {
                    return Err(LedgerError::InsufficientPosition {
                        asset_id: tx.asset_id.clone(),
                        account_id: tx.account_id.clone(),
                        date: tx.date,
                        requested: tx.quantity,
                        available: holding.quantity,
                    });
                }
                let realized =
                    tx.quantity * (price - holding.average_cost) - tx.commission - tx.tax;
                holding.quantity -= tx.quantity;
                // A fully closed position starts a fresh basis on the
                // next acquisition. Deliberate simplification over
                // tax-lot accounting.
                if holding.quantity.is_zero() {
                    holding.average_cost = Decimal::ZERO;
                }
                let record = RealizedGain {
                    date: tx.date,
                    asset_id: tx.asset_id.clone(),
                    account_id: tx.account_id.clone(),
                    quantity: tx.quantity,
                    unit_price: price,
                    average_cost: if holding.quantity.is_zero() {
                        // WAC at the time of sale, not the reset value.
                        realized_wac(realized, tx, price)
                    } else {
                        holding.average_cost
                    },
                    realized_gain: realized,
                };
                self.realized_gains.push(record.clone());
                Ok(Some(record))
            }
        }
    }

    fn acquire(&mut self, key: PositionKey, quantity: Decimal, incoming_cost: Decimal) {
        let holding = self.holdings.entry(key).or_default();
        let new_quantity = holding.quantity + quantity;
        let total_cost = holding.quantity * holding.average_cost + incoming_cost;
        holding.average_cost = total_cost / new_quantity;
        holding.quantity = new_quantity;
    }

    /// Finishes the replay: open positions (quantity > 0 only) plus all
    /// realized gains, in encounter order.
    pub fn into_outcome(self) -> ReplayOutcome {
        let mut positions: Vec<Position> = self
            .holdings
            .into_iter()
            .filter(|(_, h)| h.quantity > Decimal::zero())
            .map(|(key, h)| Position {
                asset_id: key.asset_id,
                account_id: key.account_id,
                quantity: h.quantity,
                average_cost: h.average_cost,
            })
            .collect();
        positions.sort_by(|a, b| {
            (a.asset_id.as_str(), a.account_id.as_str())
                .cmp(&(b.asset_id.as_str(), b.account_id.as_str()))
        });
        ReplayOutcome {
            positions,
            realized_gains: self.realized_gains,
        }
    }
}

// Recovers the pre-reset WAC for the realized record of a closing SELL.
fn realized_wac(realized: Decimal, tx: &Transaction, price: Decimal) -> Decimal {
    // realized = q*(price - wac) - commission - tax
    price - (realized + tx.commission + tx.tax) / tx.quantity
}

/// Replays a full ledger-ordered history. Any malformed history (e.g., a
/// SELL preceding sufficient volume after a backdated edit) surfaces
/// `InsufficientPosition` here rather than being silently clamped.
pub fn replay(
    transactions: &[Transaction],
    gift_cost_mode: GiftCostMode,
) -> Result<ReplayOutcome, LedgerError> {
    let mut state = ReplayState::new(gift_cost_mode);
    for tx in transactions {
        state.apply(tx)?;
    }
    Ok(state.into_outcome())
}
