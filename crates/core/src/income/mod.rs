//! Income module - dividend and interest accounting.

mod income_model;
mod income_service;
mod income_traits;

#[cfg(test)]
mod income_service_tests;

pub use income_model::{
    Dividend, DividendFigures, DividendUpdate, Interest, InterestUpdate, NewDividend, NewInterest,
    YearSummary,
};
pub use income_service::IncomeService;
pub use income_traits::{DividendRepositoryTrait, IncomeServiceTrait, InterestRepositoryTrait};
