//! Workbook reconciliation.
//!
//! Pipeline: parse the workbook into row candidates, validate each row
//! with the same rules as direct entry, drop duplicates of existing
//! records, then either report (dry run) or apply through the ledger and
//! income paths. Row-level problems are collected, never fatal; only an
//! unreadable workbook or an unreachable store aborts the call.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;

use crate::accounts::{AccountRepositoryTrait, AccountType, NewAccount};
use crate::assets::{AssetRepositoryTrait, NewAsset};
use crate::constants::{
    IMPORT_ACCOUNT_NAME, SHEET_DIVIDENDS, SHEET_INTERESTS, SHEET_TRANSACTIONS,
};
use crate::import::fingerprint::{
    dividend_fingerprint, interest_fingerprint, transaction_fingerprint,
};
use crate::import::import_model::ImportResult;
use crate::import::workbook::{Sheet, WorkbookParserTrait};
use crate::income::{
    DividendRepositoryTrait, IncomeServiceTrait, InterestRepositoryTrait, NewDividend, NewInterest,
};
use crate::ledger::{
    LedgerServiceTrait, NewTransaction, Transaction, TransactionFilter,
    TransactionRepositoryTrait, TransactionType,
};
use crate::portfolio::positions::{PositionKey, ReplayState};
use crate::settings::SettingsServiceTrait;
use crate::utils::parse_decimal;
use crate::Result;

const PENDING_IMPORT_ACCOUNT: &str = "pending-account::import";

/// Planned-but-not-yet-created record reference. Pending ids are
/// placeholders resolved to real store ids during commit.
fn pending_asset_id(name_key: &str) -> String {
    format!("pending-asset::{name_key}")
}

fn pending_account_id(name_key: &str) -> String {
    format!("pending-account::{name_key}")
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

struct TxCandidate {
    row: usize,
    date: NaiveDate,
    tx_type: TransactionType,
    asset_name: String,
    asset_id: String,
    /// Chosen during the planned-order walk; BUY/GIFT land on the import
    /// account, SELL is inferred from the planned positions.
    account_id: Option<String>,
    quantity: Decimal,
    price: Option<Decimal>,
    commission: Decimal,
    tax: Decimal,
    fingerprint: String,
    /// Planned ledger sequence; commit applies candidates in
    /// `(date, sequence)` order so it replays exactly what the dry run
    /// validated.
    sequence: u64,
}

struct DividendCandidate {
    row: usize,
    date: NaiveDate,
    asset_name: String,
    asset_id: String,
    shares: Option<Decimal>,
    net: Decimal,
    tax: Decimal,
    fingerprint: String,
}

struct InterestCandidate {
    row: usize,
    date: NaiveDate,
    account_name: String,
    account_id: String,
    gross: Decimal,
    net: Option<Decimal>,
    tax: Option<Decimal>,
    balance: Option<Decimal>,
    annual_rate: Option<Decimal>,
    fingerprint: String,
}

/// Reconciles a bulk workbook against the existing stores.
pub struct ImportService {
    parser: Arc<dyn WorkbookParserTrait>,
    ledger_service: Arc<dyn LedgerServiceTrait>,
    income_service: Arc<dyn IncomeServiceTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
    interest_repository: Arc<dyn InterestRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
}

impl ImportService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parser: Arc<dyn WorkbookParserTrait>,
        ledger_service: Arc<dyn LedgerServiceTrait>,
        income_service: Arc<dyn IncomeServiceTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
        interest_repository: Arc<dyn InterestRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            parser,
            ledger_service,
            income_service,
            transaction_repository,
            dividend_repository,
            interest_repository,
            asset_repository,
            account_repository,
            settings_service,
        }
    }

    /// Runs the full pipeline. A dry run performs every step and returns
    /// the same counts a commit would, without mutating any store.
    pub async fn reconcile(&self, workbook_bytes: &[u8], dry_run: bool) -> Result<ImportResult> {
        let workbook = self.parser.parse(workbook_bytes)?;
        let settings = self.settings_service.get_settings()?;
        let money_scale = settings.rounding_money;
        let qty_scale = settings.rounding_qty;

        let mut result = ImportResult::new(dry_run);
        // Assets and accounts referenced by name only, keyed by
        // normalized name, created during commit.
        let mut planned_assets: HashMap<String, NewAsset> = HashMap::new();
        let mut planned_accounts: HashMap<String, NewAccount> = HashMap::new();
        // Fingerprints of existing records plus earlier rows of this
        // import; membership means duplicate.
        let mut seen_tx = self.transaction_repository.transaction_fingerprints()?;
        let mut seen_dividends = self.dividend_repository.dividend_fingerprints()?;
        let mut seen_interests = self.interest_repository.interest_fingerprints()?;
        self.seed_unfingerprinted(
            &mut seen_tx,
            &mut seen_dividends,
            &mut seen_interests,
            money_scale,
            qty_scale,
        )?;

        let mut transactions = Vec::new();
        if let Some(sheet) = workbook.sheet(SHEET_TRANSACTIONS) {
            transactions = self.collect_transactions(
                sheet,
                money_scale,
                qty_scale,
                &mut seen_tx,
                &mut planned_assets,
                &mut result,
            )?;
            self.plan_transaction_order(&mut transactions, &mut result)?;
        }

        let mut dividends = Vec::new();
        if let Some(sheet) = workbook.sheet(SHEET_DIVIDENDS) {
            dividends = self.collect_dividends(
                sheet,
                money_scale,
                qty_scale,
                &mut seen_dividends,
                &mut planned_assets,
                &mut result,
            )?;
        }

        let mut interests = Vec::new();
        if let Some(sheet) = workbook.sheet(SHEET_INTERESTS) {
            interests = self.collect_interests(
                sheet,
                money_scale,
                &mut seen_interests,
                &mut planned_accounts,
                &mut result,
            )?;
        }

        // Only assets an accepted row still references count as planned.
        let referenced: HashSet<&str> = transactions
            .iter()
            .map(|t| t.asset_id.as_str())
            .chain(dividends.iter().map(|d| d.asset_id.as_str()))
            .collect();
        planned_assets.retain(|key, _| referenced.contains(pending_asset_id(key).as_str()));

        if dry_run {
            result.inserted.transactions = transactions.len();
            result.inserted.dividends = dividends.len();
            result.inserted.interests = interests.len();
            result.inserted.assets = planned_assets.len();
            debug!(
                "Dry-run import: {} transactions, {} dividends, {} interests, {} new assets, {} errors",
                transactions.len(),
                dividends.len(),
                interests.len(),
                planned_assets.len(),
                result.errors.len()
            );
            return Ok(result);
        }

        self.commit(transactions, dividends, interests, planned_assets, planned_accounts, &mut result)
            .await?;
        Ok(result)
    }

    /// Records entered directly carry no fingerprint. Hashing their
    /// fields at the configured scales lets a row re-importing the same
    /// figures be skipped as a duplicate instead of doubled.
    fn seed_unfingerprinted(
        &self,
        seen_tx: &mut HashSet<String>,
        seen_dividends: &mut HashSet<String>,
        seen_interests: &mut HashSet<String>,
        money_scale: u32,
        qty_scale: u32,
    ) -> Result<()> {
        let asset_names: HashMap<String, String> = self
            .asset_repository
            .list_assets()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();

        for tx in self
            .transaction_repository
            .list_transactions(&TransactionFilter::default())?
        {
            if tx.fingerprint.is_some() {
                continue;
            }
            if let Some(name) = asset_names.get(&tx.asset_id) {
                seen_tx.insert(transaction_fingerprint(
                    tx.date,
                    tx.tx_type.as_db_str(),
                    name,
                    tx.quantity,
                    tx.price.unwrap_or(Decimal::ZERO),
                    money_scale,
                    qty_scale,
                ));
            }
        }

        for dividend in self.dividend_repository.list_dividends()? {
            if dividend.fingerprint.is_some() {
                continue;
            }
            if let Some(name) = asset_names.get(&dividend.asset_id) {
                seen_dividends.insert(dividend_fingerprint(
                    dividend.date,
                    name,
                    dividend.shares.unwrap_or(Decimal::ZERO),
                    dividend.net,
                    money_scale,
                    qty_scale,
                ));
            }
        }

        let account_names: HashMap<String, String> = self
            .account_repository
            .list_accounts()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        for interest in self.interest_repository.list_interests()? {
            if interest.fingerprint.is_some() {
                continue;
            }
            if let Some(name) = account_names.get(&interest.account_id) {
                seen_interests.insert(interest_fingerprint(
                    interest.date,
                    name,
                    interest.net,
                    money_scale,
                ));
            }
        }
        Ok(())
    }

    fn collect_transactions(
        &self,
        sheet: &Sheet,
        money_scale: u32,
        qty_scale: u32,
        seen: &mut HashSet<String>,
        planned_assets: &mut HashMap<String, NewAsset>,
        result: &mut ImportResult,
    ) -> Result<Vec<TxCandidate>> {
        let col_date = sheet.column_index("Date");
        let col_type = sheet.column_index("Type");
        let col_asset = sheet.column_index("Asset");
        let col_ticker = sheet.column_index("Ticker");
        let col_quantity = sheet.column_index("Quantity");
        let col_price = sheet.column_index("Price");
        let col_commission = sheet.column_index("Commission");
        let col_tax = sheet.column_index("Tax");

        let mut candidates = Vec::new();
        for (index, cells) in sheet.rows.iter().enumerate() {
            let row = index + 2;
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            let date = match parse_date(sheet.cell(cells, col_date)) {
                Ok(d) => d,
                Err(message) => {
                    result.push_error(&sheet.name, row, "Date", message);
                    continue;
                }
            };
            let raw_type = sheet.cell(cells, col_type);
            let tx_type = match TransactionType::from_db_str(raw_type) {
                Some(t) => t,
                None => {
                    result.push_error(
                        &sheet.name,
                        row,
                        "Type",
                        format!("unknown transaction type '{raw_type}'"),
                    );
                    continue;
                }
            };
            let asset_name = sheet.cell(cells, col_asset).to_string();
            if asset_name.is_empty() {
                result.push_error(&sheet.name, row, "Asset", "asset name is required");
                continue;
            }
            let quantity = match parse_decimal(sheet.cell(cells, col_quantity)) {
                Ok(q) if q > Decimal::ZERO => q,
                Ok(_) => {
                    result.push_error(&sheet.name, row, "Quantity", "must be positive");
                    continue;
                }
                Err(e) => {
                    result.push_error(&sheet.name, row, "Quantity", e.to_string());
                    continue;
                }
            };
            let price = match parse_optional(sheet.cell(cells, col_price)) {
                Ok(p) => p,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Price", e.to_string());
                    continue;
                }
            };
            if price.is_none() && tx_type != TransactionType::Gift {
                result.push_error(&sheet.name, row, "Price", "required for BUY and SELL");
                continue;
            }
            if matches!(price, Some(p) if p < Decimal::ZERO) {
                result.push_error(&sheet.name, row, "Price", "must not be negative");
                continue;
            }
            let commission = match parse_non_negative(sheet.cell(cells, col_commission)) {
                Ok(v) => v,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Commission", e);
                    continue;
                }
            };
            let tax = match parse_non_negative(sheet.cell(cells, col_tax)) {
                Ok(v) => v,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Tax", e);
                    continue;
                }
            };

            let fingerprint = transaction_fingerprint(
                date,
                tx_type.as_db_str(),
                &asset_name,
                quantity,
                price.unwrap_or(Decimal::ZERO),
                money_scale,
                qty_scale,
            );
            if !seen.insert(fingerprint.clone()) {
                result.skipped_duplicates.transactions += 1;
                continue;
            }

            let asset_id = self.resolve_asset(
                &asset_name,
                sheet.cell(cells, col_ticker),
                planned_assets,
            )?;

            candidates.push(TxCandidate {
                row,
                date,
                tx_type,
                asset_name,
                asset_id,
                account_id: None,
                quantity,
                price,
                commission,
                tax,
                fingerprint,
                sequence: 0,
            });
        }
        Ok(candidates)
    }

    /// Existing asset by name (then ticker), or a pending placeholder
    /// registered for creation at commit.
    fn resolve_asset(
        &self,
        asset_name: &str,
        ticker: &str,
        planned_assets: &mut HashMap<String, NewAsset>,
    ) -> Result<String> {
        if let Some(asset) = self.asset_repository.find_asset_by_name(asset_name)? {
            return Ok(asset.id);
        }
        if !ticker.is_empty() {
            if let Some(asset) = self.asset_repository.find_asset_by_ticker(ticker)? {
                return Ok(asset.id);
            }
        }
        let key = name_key(asset_name);
        let planned = planned_assets.entry(key.clone()).or_insert_with(|| NewAsset {
            name: asset_name.trim().to_string(),
            ..Default::default()
        });
        if planned.ticker.is_none() && !ticker.is_empty() {
            planned.ticker = Some(ticker.to_string());
        }
        Ok(pending_asset_id(&key))
    }

    /// Replays existing ledger history merged with the candidates in
    /// final planned order. A candidate SELL that exceeds its derivable
    /// position at its ordering point becomes a row error and is dropped;
    /// BUY/GIFT candidates land on the import account and SELLs are
    /// inferred from the planned positions, largest first.
    fn plan_transaction_order(
        &self,
        candidates: &mut Vec<TxCandidate>,
        result: &mut ImportResult,
    ) -> Result<()> {
        let existing = self
            .transaction_repository
            .list_transactions(&TransactionFilter::default())?;
        let base_sequence = existing.iter().map(|t| t.sequence).max().unwrap_or(0) + 1;
        let gift_cost_mode = self.settings_service.get_settings()?.gift_cost_mode;

        let import_account_id = match self
            .account_repository
            .find_account_by_name(IMPORT_ACCOUNT_NAME)?
        {
            Some(account) => account.id,
            None => PENDING_IMPORT_ACCOUNT.to_string(),
        };

        enum Entry {
            Existing(Transaction),
            Candidate(usize),
        }
        let mut order: Vec<(NaiveDate, u64, Entry)> = existing
            .into_iter()
            .map(|t| (t.date, t.sequence, Entry::Existing(t)))
            .collect();
        for (offset, candidate) in candidates.iter().enumerate() {
            order.push((
                candidate.date,
                base_sequence + offset as u64,
                Entry::Candidate(offset),
            ));
        }
        order.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut state = ReplayState::new(gift_cost_mode);
        // Accounts seen holding each asset, for SELL inference.
        let mut holders: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut rejected: HashSet<usize> = HashSet::new();

        for (_, sequence, entry) in order {
            match entry {
                Entry::Existing(tx) => {
                    holders
                        .entry(tx.asset_id.clone())
                        .or_default()
                        .insert(tx.account_id.clone());
                    if let Err(e) = state.apply(&tx) {
                        // A pre-existing inconsistency is not this
                        // import's problem; keep going.
                        warn!("Existing transaction {} fails replay: {e}", tx.id);
                    }
                }
                Entry::Candidate(offset) => {
                    let candidate = &mut candidates[offset];
                    let account_id = match candidate.tx_type {
                        TransactionType::Buy | TransactionType::Gift => import_account_id.clone(),
                        TransactionType::Sell => {
                            let covering = holders
                                .get(&candidate.asset_id)
                                .map(|accounts| {
                                    let mut best: Option<(Decimal, &String)> = None;
                                    for account in accounts {
                                        let qty = state.quantity(&PositionKey::new(
                                            &candidate.asset_id,
                                            account,
                                        ));
                                        if qty >= candidate.quantity
                                            && best.map(|(q, _)| qty > q).unwrap_or(true)
                                        {
                                            best = Some((qty, account));
                                        }
                                    }
                                    best.map(|(_, account)| account.clone())
                                })
                                .unwrap_or(None);
                            match covering {
                                Some(account) => account,
                                None => {
                                    result.push_error(
                                        SHEET_TRANSACTIONS,
                                        candidate.row,
                                        "Quantity",
                                        format!(
                                            "SELL of {} {} exceeds the position held at {}",
                                            candidate.quantity,
                                            candidate.asset_name,
                                            candidate.date
                                        ),
                                    );
                                    rejected.insert(offset);
                                    continue;
                                }
                            }
                        }
                    };

                    let planned = Transaction {
                        id: format!("import-row-{}", candidate.row),
                        date: candidate.date,
                        tx_type: candidate.tx_type,
                        asset_id: candidate.asset_id.clone(),
                        account_id: account_id.clone(),
                        quantity: candidate.quantity,
                        price: candidate.price,
                        commission: candidate.commission,
                        tax: candidate.tax,
                        notes: None,
                        fingerprint: Some(candidate.fingerprint.clone()),
                        sequence,
                        created_at: Utc::now(),
                    };
                    match state.apply(&planned) {
                        Ok(_) => {
                            holders
                                .entry(candidate.asset_id.clone())
                                .or_default()
                                .insert(account_id.clone());
                            candidate.account_id = Some(account_id);
                            candidate.sequence = sequence;
                        }
                        Err(e) => {
                            result.push_error(
                                SHEET_TRANSACTIONS,
                                candidate.row,
                                "Quantity",
                                e.to_string(),
                            );
                            rejected.insert(offset);
                        }
                    }
                }
            }
        }

        let mut offset = 0;
        candidates.retain(|_| {
            let keep = !rejected.contains(&offset);
            offset += 1;
            keep
        });
        Ok(())
    }

    fn collect_dividends(
        &self,
        sheet: &Sheet,
        money_scale: u32,
        qty_scale: u32,
        seen: &mut HashSet<String>,
        planned_assets: &mut HashMap<String, NewAsset>,
        result: &mut ImportResult,
    ) -> Result<Vec<DividendCandidate>> {
        let col_date = sheet.column_index("Date");
        let col_asset = sheet.column_index("Asset");
        let col_shares = sheet.column_index("Shares");
        let col_gross = sheet.column_index("Gross");
        let col_tax = sheet.column_index("Tax");
        let col_net = sheet.column_index("Net");

        let mut candidates = Vec::new();
        for (index, cells) in sheet.rows.iter().enumerate() {
            let row = index + 2;
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            let date = match parse_date(sheet.cell(cells, col_date)) {
                Ok(d) => d,
                Err(message) => {
                    result.push_error(&sheet.name, row, "Date", message);
                    continue;
                }
            };
            let asset_name = sheet.cell(cells, col_asset).to_string();
            if asset_name.is_empty() {
                result.push_error(&sheet.name, row, "Asset", "asset name is required");
                continue;
            }
            let shares = match parse_optional(sheet.cell(cells, col_shares)) {
                Ok(s) => s,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Shares", e.to_string());
                    continue;
                }
            };
            let tax = match parse_non_negative(sheet.cell(cells, col_tax)) {
                Ok(v) => v,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Tax", e);
                    continue;
                }
            };
            let gross = match parse_optional(sheet.cell(cells, col_gross)) {
                Ok(g) => g,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Gross", e.to_string());
                    continue;
                }
            };
            let net = match parse_optional(sheet.cell(cells, col_net)) {
                Ok(Some(n)) => n,
                Ok(None) => match gross {
                    Some(g) => g - tax,
                    None => {
                        result.push_error(&sheet.name, row, "Net", "net or gross is required");
                        continue;
                    }
                },
                Err(e) => {
                    result.push_error(&sheet.name, row, "Net", e.to_string());
                    continue;
                }
            };
            if let Some(g) = gross {
                // Tolerance of one cent at the configured scale.
                let tolerance = Decimal::new(1, money_scale);
                if (g - (net + tax)).abs() > tolerance {
                    result.push_error(
                        &sheet.name,
                        row,
                        "Gross",
                        format!("gross {g} does not equal net {net} + tax {tax}"),
                    );
                    continue;
                }
            }

            let shares_for_hash = shares.unwrap_or(Decimal::ZERO);
            let fingerprint =
                dividend_fingerprint(date, &asset_name, shares_for_hash, net, money_scale, qty_scale);
            if !seen.insert(fingerprint.clone()) {
                result.skipped_duplicates.dividends += 1;
                continue;
            }

            let asset_id = self.resolve_asset(&asset_name, "", planned_assets)?;
            candidates.push(DividendCandidate {
                row,
                date,
                asset_name,
                asset_id,
                shares,
                net,
                tax,
                fingerprint,
            });
        }
        Ok(candidates)
    }

    fn collect_interests(
        &self,
        sheet: &Sheet,
        money_scale: u32,
        seen: &mut HashSet<String>,
        planned_accounts: &mut HashMap<String, NewAccount>,
        result: &mut ImportResult,
    ) -> Result<Vec<InterestCandidate>> {
        let col_date = sheet.column_index("Date");
        let col_account = sheet.column_index("Account");
        let col_gross = sheet.column_index("Gross");
        let col_net = sheet.column_index("Net");
        let col_balance = sheet.column_index("Balance");
        let col_rate = sheet.column_index("Annual Rate");

        let mut candidates = Vec::new();
        for (index, cells) in sheet.rows.iter().enumerate() {
            let row = index + 2;
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            let date = match parse_date(sheet.cell(cells, col_date)) {
                Ok(d) => d,
                Err(message) => {
                    result.push_error(&sheet.name, row, "Date", message);
                    continue;
                }
            };
            let account_name = sheet.cell(cells, col_account).to_string();
            if account_name.is_empty() {
                result.push_error(&sheet.name, row, "Account", "account name is required");
                continue;
            }
            let gross = match parse_decimal(sheet.cell(cells, col_gross)) {
                Ok(g) => g,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Gross", e.to_string());
                    continue;
                }
            };
            let net = match parse_optional(sheet.cell(cells, col_net)) {
                Ok(n) => n,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Net", e.to_string());
                    continue;
                }
            };
            let balance = match parse_optional(sheet.cell(cells, col_balance)) {
                Ok(b) => b,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Balance", e.to_string());
                    continue;
                }
            };
            let annual_rate = match parse_optional(sheet.cell(cells, col_rate)) {
                Ok(r) => r,
                Err(e) => {
                    result.push_error(&sheet.name, row, "Annual Rate", e.to_string());
                    continue;
                }
            };
            if net.map(|n| n > gross).unwrap_or(false) {
                result.push_error(&sheet.name, row, "Net", "net exceeds gross");
                continue;
            }

            let fingerprint =
                interest_fingerprint(date, &account_name, net.unwrap_or(gross), money_scale);
            if !seen.insert(fingerprint.clone()) {
                result.skipped_duplicates.interests += 1;
                continue;
            }

            let account_id = match self.account_repository.find_account_by_name(&account_name)? {
                Some(account) => account.id,
                None => {
                    let key = name_key(&account_name);
                    planned_accounts.entry(key.clone()).or_insert_with(|| NewAccount {
                        name: account_name.trim().to_string(),
                        account_type: AccountType::Savings,
                        ..Default::default()
                    });
                    pending_account_id(&key)
                }
            };

            candidates.push(InterestCandidate {
                row,
                date,
                account_name,
                account_id,
                gross,
                net,
                tax: net.map(|n| gross - n),
                balance,
                annual_rate,
                fingerprint,
            });
        }
        Ok(candidates)
    }

    /// Applies every accepted candidate. A row failing here is reported
    /// and skipped; already-applied rows are never rolled back.
    async fn commit(
        &self,
        mut transactions: Vec<TxCandidate>,
        dividends: Vec<DividendCandidate>,
        interests: Vec<InterestCandidate>,
        planned_assets: HashMap<String, NewAsset>,
        planned_accounts: HashMap<String, NewAccount>,
        result: &mut ImportResult,
    ) -> Result<()> {
        let mut id_map: HashMap<String, String> = HashMap::new();

        for (key, new_asset) in planned_assets {
            let asset = self.asset_repository.create_asset(new_asset).await?;
            debug!("Import created asset '{}'", asset.name);
            id_map.insert(pending_asset_id(&key), asset.id);
            result.inserted.assets += 1;
        }
        for (key, new_account) in planned_accounts {
            let account = self.account_repository.create_account(new_account).await?;
            debug!("Import created account '{}'", account.name);
            id_map.insert(pending_account_id(&key), account.id);
        }
        if transactions
            .iter()
            .any(|t| t.account_id.as_deref() == Some(PENDING_IMPORT_ACCOUNT))
        {
            let account = self
                .account_repository
                .create_account(NewAccount {
                    name: IMPORT_ACCOUNT_NAME.to_string(),
                    account_type: AccountType::Investment,
                    ..Default::default()
                })
                .await?;
            id_map.insert(PENDING_IMPORT_ACCOUNT.to_string(), account.id);
        }
        let resolve = |id: &str| -> String {
            id_map.get(id).cloned().unwrap_or_else(|| id.to_string())
        };

        // Apply in the order the planning replay validated, not sheet
        // order; a SELL row listed above its covering BUY must still
        // land after it.
        transactions.sort_by(|a, b| (a.date, a.sequence).cmp(&(b.date, b.sequence)));
        for candidate in transactions {
            let recorded = self
                .ledger_service
                .record(NewTransaction {
                    date: candidate.date,
                    tx_type: candidate.tx_type,
                    asset_id: resolve(&candidate.asset_id),
                    account_id: candidate.account_id.as_deref().map(resolve),
                    quantity: candidate.quantity,
                    price: candidate.price,
                    commission: Some(candidate.commission),
                    tax: Some(candidate.tax),
                    notes: None,
                    fingerprint: Some(candidate.fingerprint),
                })
                .await;
            match recorded {
                Ok(_) => result.inserted.transactions += 1,
                Err(e) => result.push_error(
                    SHEET_TRANSACTIONS,
                    candidate.row,
                    "Quantity",
                    format!("{} {}: {e}", candidate.tx_type.as_db_str(), candidate.asset_name),
                ),
            }
        }

        for candidate in dividends {
            let recorded = self
                .income_service
                .record_dividend(NewDividend {
                    date: candidate.date,
                    asset_id: resolve(&candidate.asset_id),
                    shares: candidate.shares,
                    net: candidate.net,
                    tax: Some(candidate.tax),
                    fingerprint: Some(candidate.fingerprint),
                })
                .await;
            match recorded {
                Ok(_) => result.inserted.dividends += 1,
                Err(e) => result.push_error(
                    SHEET_DIVIDENDS,
                    candidate.row,
                    "Net",
                    format!("dividend on {}: {e}", candidate.asset_name),
                ),
            }
        }

        for candidate in interests {
            let recorded = self
                .income_service
                .record_interest(NewInterest {
                    date: candidate.date,
                    account_id: resolve(&candidate.account_id),
                    gross: candidate.gross,
                    net: candidate.net,
                    tax: candidate.tax,
                    balance: candidate.balance,
                    annual_rate: candidate.annual_rate,
                    fingerprint: Some(candidate.fingerprint),
                })
                .await;
            match recorded {
                Ok(_) => result.inserted.interests += 1,
                Err(e) => result.push_error(
                    SHEET_INTERESTS,
                    candidate.row,
                    "Gross",
                    format!("interest on {}: {e}", candidate.account_name),
                ),
            }
        }

        debug!(
            "Import commit: {} transactions, {} dividends, {} interests, {} new assets, {} errors",
            result.inserted.transactions,
            result.inserted.dividends,
            result.inserted.interests,
            result.inserted.assets,
            result.errors.len()
        );
        Ok(())
    }
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    if raw.is_empty() {
        return Err("date is required".to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| format!("unrecognized date '{raw}'"))
}

fn parse_optional(raw: &str) -> Result<Option<Decimal>> {
    if raw.is_empty() {
        Ok(None)
    } else {
        parse_decimal(raw).map(Some)
    }
}

fn parse_non_negative(raw: &str) -> std::result::Result<Decimal, String> {
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let value = parse_decimal(raw).map_err(|e| e.to_string())?;
    if value < Decimal::ZERO {
        return Err("must not be negative".to_string());
    }
    Ok(value)
}
