//! Property-based integration tests for the cost-basis replay engine.
//!
//! These tests verify that universal invariants hold across randomly
//! generated transaction histories, using the `proptest` crate.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use patrimonio_core::ledger::{Transaction, TransactionType};
use patrimonio_core::portfolio::positions::{replay, PositionKey, ReplayState};
use patrimonio_core::settings::GiftCostMode;

// =============================================================================
// Generators
// =============================================================================

#[derive(Debug, Clone)]
struct Op {
    is_buy: bool,
    quantity: u32,
    price: u32,
}

fn arb_op() -> impl Strategy<Value = Op> {
    (any::<bool>(), 1u32..200, 1u32..500).prop_map(|(is_buy, quantity, price)| Op {
        is_buy,
        quantity,
        price,
    })
}

fn tx(index: usize, op: &Op) -> Transaction {
    Transaction {
        id: format!("tx-{index}"),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        tx_type: if op.is_buy {
            TransactionType::Buy
        } else {
            TransactionType::Sell
        },
        asset_id: "asset".to_string(),
        account_id: "account".to_string(),
        quantity: Decimal::from(op.quantity),
        price: Some(Decimal::from(op.price)),
        commission: Decimal::ZERO,
        tax: Decimal::ZERO,
        notes: None,
        fingerprint: None,
        sequence: index as u64 + 1,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Applying any sequence of operations never drives a holding
    /// negative, and a rejected SELL leaves the state untouched.
    #[test]
    fn quantity_never_negative(ops in prop::collection::vec(arb_op(), 1..40)) {
        let key = PositionKey::new("asset", "account");
        let mut state = ReplayState::new(GiftCostMode::Zero);
        for (i, op) in ops.iter().enumerate() {
            let before = state.quantity(&key);
            match state.apply(&tx(i, op)) {
                Ok(_) => {}
                Err(_) => {
                    prop_assert!(!op.is_buy);
                    prop_assert_eq!(state.quantity(&key), before);
                }
            }
            prop_assert!(state.quantity(&key) >= Decimal::ZERO);
        }
    }

    /// A buy-only history always replays cleanly and the open position
    /// carries the exact summed quantity.
    #[test]
    fn buys_accumulate_exact_quantity(ops in prop::collection::vec(arb_op(), 1..40)) {
        let buys: Vec<Transaction> = ops
            .iter()
            .enumerate()
            .map(|(i, op)| tx(i, &Op { is_buy: true, ..op.clone() }))
            .collect();
        let total: Decimal = buys.iter().map(|t| t.quantity).sum();

        let outcome = replay(&buys, GiftCostMode::Zero).unwrap();
        prop_assert_eq!(outcome.positions.len(), 1);
        prop_assert_eq!(outcome.positions[0].quantity, total);
        prop_assert!(outcome.realized_gains.is_empty());
    }

    /// Buying and then liquidating the full position leaves no open
    /// holding, and without fees the realized gain is exactly
    /// quantity * (sell price - buy price).
    #[test]
    fn full_liquidation_closes_position(quantity in 1u32..500, buy in 1u32..400, sell in 1u32..400) {
        let history = vec![
            tx(0, &Op { is_buy: true, quantity, price: buy }),
            tx(1, &Op { is_buy: false, quantity, price: sell }),
        ];

        let outcome = replay(&history, GiftCostMode::Zero).unwrap();
        prop_assert!(outcome.positions.is_empty());
        prop_assert_eq!(outcome.realized_gains.len(), 1);
        let expected = Decimal::from(quantity) * (Decimal::from(sell) - Decimal::from(buy));
        prop_assert_eq!(outcome.realized_gains[0].realized_gain, expected);
    }

    /// Every SELL accepted by the replay produces exactly one realized
    /// gain record.
    #[test]
    fn each_sell_realizes_once(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut state = ReplayState::new(GiftCostMode::Zero);
        let mut accepted_sells = 0usize;
        for (i, op) in ops.iter().enumerate() {
            if let Ok(realized) = state.apply(&tx(i, op)) {
                if !op.is_buy {
                    prop_assert!(realized.is_some());
                    accepted_sells += 1;
                }
            }
        }
        prop_assert_eq!(state.into_outcome().realized_gains.len(), accepted_sells);
    }
}
