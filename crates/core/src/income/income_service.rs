use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use log::debug;
use num_traits::Zero;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::accounts::AccountRepositoryTrait;
use crate::assets::AssetRepositoryTrait;
use crate::errors::ValidationError;
use crate::income::{
    Dividend, DividendFigures, DividendRepositoryTrait, DividendUpdate, IncomeServiceTrait,
    Interest, InterestRepositoryTrait, InterestUpdate, NewDividend, NewInterest, YearSummary,
};
use crate::portfolio::positions::PositionServiceTrait;
use crate::settings::SettingsServiceTrait;
use crate::utils::{ratio, round_money, Page};
use crate::Result;

/// Service computing and persisting income events.
pub struct IncomeService {
    dividend_repository: Arc<dyn DividendRepositoryTrait>,
    interest_repository: Arc<dyn InterestRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    position_service: Arc<dyn PositionServiceTrait>,
    settings_service: Arc<dyn SettingsServiceTrait>,
}

impl IncomeService {
    pub fn new(
        dividend_repository: Arc<dyn DividendRepositoryTrait>,
        interest_repository: Arc<dyn InterestRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        position_service: Arc<dyn PositionServiceTrait>,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        Self {
            dividend_repository,
            interest_repository,
            asset_repository,
            account_repository,
            position_service,
            settings_service,
        }
    }

    fn money_scale(&self) -> Result<u32> {
        Ok(self.settings_service.get_settings()?.rounding_money)
    }

    fn check_non_negative(field: &str, value: Decimal) -> Result<()> {
        if value < Decimal::zero() {
            return Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: "must not be negative".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl IncomeServiceTrait for IncomeService {
    fn compute_dividend(&self, net: Decimal, tax: Decimal) -> Result<DividendFigures> {
        Self::check_non_negative("net", net)?;
        Self::check_non_negative("tax", tax)?;
        let scale = self.money_scale()?;
        let net = round_money(net, scale);
        let tax = round_money(tax, scale);
        let gross = round_money(net + tax, scale);
        Ok(DividendFigures {
            gross,
            net,
            tax,
            withholding_rate: ratio(tax, gross),
        })
    }

    fn compute_interest(&self, gross: Decimal, tax: Decimal) -> Result<Decimal> {
        Self::check_non_negative("gross", gross)?;
        Self::check_non_negative("tax", tax)?;
        let scale = self.money_scale()?;
        Ok(round_money(gross - tax, scale))
    }

    fn get_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        self.dividend_repository.get_dividend(dividend_id)
    }

    fn search_dividends(&self, page: usize, page_size: usize) -> Result<Page<Dividend>> {
        Ok(Page::slice(
            self.dividend_repository.list_dividends()?,
            page,
            page_size,
        ))
    }

    async fn record_dividend(&self, new_dividend: NewDividend) -> Result<Dividend> {
        self.asset_repository.get_asset(&new_dividend.asset_id)?;
        let figures =
            self.compute_dividend(new_dividend.net, new_dividend.tax.unwrap_or(Decimal::ZERO))?;
        let dividend = Dividend {
            id: Uuid::new_v4().to_string(),
            date: new_dividend.date,
            asset_id: new_dividend.asset_id,
            shares: new_dividend.shares,
            gross: figures.gross,
            tax: figures.tax,
            net: figures.net,
            withholding_rate: figures.withholding_rate,
            fingerprint: new_dividend.fingerprint,
            created_at: Utc::now(),
        };
        let saved = self.dividend_repository.insert_dividend(dividend).await?;
        debug!(
            "Recorded dividend {} for asset {}: net {}",
            saved.id, saved.asset_id, saved.net
        );
        Ok(saved)
    }

    async fn amend_dividend(&self, update: DividendUpdate) -> Result<Dividend> {
        let mut dividend = self.dividend_repository.get_dividend(&update.id)?;
        if let Some(date) = update.date {
            dividend.date = date;
        }
        if let Some(shares) = update.shares {
            dividend.shares = Some(shares);
        }
        let net = update.net.unwrap_or(dividend.net);
        let tax = update.tax.unwrap_or(dividend.tax);
        let figures = self.compute_dividend(net, tax)?;
        dividend.gross = figures.gross;
        dividend.net = figures.net;
        dividend.tax = figures.tax;
        dividend.withholding_rate = figures.withholding_rate;
        self.dividend_repository.update_dividend(dividend).await
    }

    async fn remove_dividend(&self, dividend_id: &str) -> Result<Dividend> {
        self.dividend_repository.delete_dividend(dividend_id).await
    }

    fn get_interest(&self, interest_id: &str) -> Result<Interest> {
        self.interest_repository.get_interest(interest_id)
    }

    fn search_interests(&self, page: usize, page_size: usize) -> Result<Page<Interest>> {
        Ok(Page::slice(
            self.interest_repository.list_interests()?,
            page,
            page_size,
        ))
    }

    async fn record_interest(&self, new_interest: NewInterest) -> Result<Interest> {
        self.account_repository.get_account(&new_interest.account_id)?;
        Self::check_non_negative("gross", new_interest.gross)?;
        let scale = self.money_scale()?;
        let gross = round_money(new_interest.gross, scale);
        let net = match new_interest.net {
            Some(net) => round_money(net, scale),
            None => self.compute_interest(gross, new_interest.tax.unwrap_or(Decimal::ZERO))?,
        };
        let interest = Interest {
            id: Uuid::new_v4().to_string(),
            date: new_interest.date,
            account_id: new_interest.account_id,
            gross,
            net,
            balance: new_interest.balance,
            annual_rate: new_interest.annual_rate,
            fingerprint: new_interest.fingerprint,
            created_at: Utc::now(),
        };
        self.interest_repository.insert_interest(interest).await
    }

    async fn amend_interest(&self, update: InterestUpdate) -> Result<Interest> {
        let mut interest = self.interest_repository.get_interest(&update.id)?;
        let scale = self.money_scale()?;
        if let Some(date) = update.date {
            interest.date = date;
        }
        if let Some(gross) = update.gross {
            Self::check_non_negative("gross", gross)?;
            interest.gross = round_money(gross, scale);
        }
        if let Some(net) = update.net {
            interest.net = round_money(net, scale);
        }
        if let Some(balance) = update.balance {
            interest.balance = Some(balance);
        }
        if let Some(annual_rate) = update.annual_rate {
            interest.annual_rate = Some(annual_rate);
        }
        self.interest_repository.update_interest(interest).await
    }

    async fn remove_interest(&self, interest_id: &str) -> Result<Interest> {
        self.interest_repository.delete_interest(interest_id).await
    }

    fn year_summary(&self) -> Result<Vec<YearSummary>> {
        let scale = self.money_scale()?;
        let mut years: BTreeMap<i32, YearSummary> = BTreeMap::new();

        for dividend in self.dividend_repository.list_dividends()? {
            let entry = years
                .entry(dividend.date.year())
                .or_insert_with(|| YearSummary::empty(dividend.date.year()));
            entry.dividends_gross += dividend.gross;
            entry.dividends_tax += dividend.tax;
            entry.dividends_net += dividend.net;
        }
        for interest in self.interest_repository.list_interests()? {
            let entry = years
                .entry(interest.date.year())
                .or_insert_with(|| YearSummary::empty(interest.date.year()));
            entry.interests_gross += interest.gross;
            entry.interests_net += interest.net;
        }
        for sale in self.position_service.realized_gains()? {
            let entry = years
                .entry(sale.date.year())
                .or_insert_with(|| YearSummary::empty(sale.date.year()));
            entry.sales_pnl += sale.realized_gain;
        }

        Ok(years
            .into_values()
            .map(|mut summary| {
                summary.dividends_gross = round_money(summary.dividends_gross, scale);
                summary.dividends_tax = round_money(summary.dividends_tax, scale);
                summary.dividends_net = round_money(summary.dividends_net, scale);
                summary.interests_gross = round_money(summary.interests_gross, scale);
                summary.interests_net = round_money(summary.interests_net, scale);
                summary.sales_pnl = round_money(summary.sales_pnl, scale);
                summary.total_net = round_money(
                    summary.dividends_net + summary.interests_net + summary.sales_pnl,
                    scale,
                );
                summary
            })
            .collect())
    }
}
