//! Record fingerprints for import deduplication.
//!
//! A fingerprint is a sha256 over the identifying fields of a record,
//! rounded at the configured scales first so that `10.0` and
//! `10.0000001` shares of the same payout collapse to one hash.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::utils::{round_money, round_qty};

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parts.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

pub fn transaction_fingerprint(
    date: NaiveDate,
    tx_type: &str,
    asset_name: &str,
    quantity: Decimal,
    price: Decimal,
    money_scale: u32,
    qty_scale: u32,
) -> String {
    digest(&[
        "tx",
        &date.format("%Y-%m-%d").to_string(),
        &tx_type.to_uppercase(),
        &asset_name.trim().to_lowercase(),
        &round_qty(quantity, qty_scale).normalize().to_string(),
        &round_money(price, money_scale).normalize().to_string(),
    ])
}

pub fn dividend_fingerprint(
    date: NaiveDate,
    asset_name: &str,
    shares: Decimal,
    net: Decimal,
    money_scale: u32,
    qty_scale: u32,
) -> String {
    digest(&[
        "dividend",
        &date.format("%Y-%m-%d").to_string(),
        &asset_name.trim().to_lowercase(),
        &round_qty(shares, qty_scale).normalize().to_string(),
        &round_money(net, money_scale).normalize().to_string(),
    ])
}

pub fn interest_fingerprint(
    date: NaiveDate,
    account_name: &str,
    net: Decimal,
    money_scale: u32,
) -> String {
    digest(&[
        "interest",
        &date.format("%Y-%m-%d").to_string(),
        &account_name.trim().to_lowercase(),
        &round_money(net, money_scale).normalize().to_string(),
    ])
}
