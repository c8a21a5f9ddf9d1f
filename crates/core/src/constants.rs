/// Default base currency for new installations.
pub const DEFAULT_BASE_CURRENCY: &str = "EUR";

/// Decimal precision for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Decimal precision for quantities.
pub const QUANTITY_SCALE: u32 = 6;

/// Decimal precision for withholding and percentage rates.
pub const RATE_SCALE: u32 = 4;

/// Maximum simultaneous outbound quote requests.
pub const QUOTE_BATCH_SIZE: usize = 10;

/// Per-ticker quote request timeout in seconds.
pub const QUOTE_TIMEOUT_SECS: u64 = 10;

/// Account that receives imported transactions (the workbook carries no
/// account column).
pub const IMPORT_ACCOUNT_NAME: &str = "Imported Brokerage";

/// Expected workbook sheet names.
pub const SHEET_TRANSACTIONS: &str = "Transactions";
pub const SHEET_DIVIDENDS: &str = "Dividends";
pub const SHEET_INTERESTS: &str = "Interests";
