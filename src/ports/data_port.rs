//! Market-data access port trait.

use crate::domain::error::SignalError;
use crate::domain::price_history::PriceHistory;
use chrono::NaiveDate;

/// Source of daily closing prices.
///
/// `code` is the configured instrument code; `symbol` is the provider-side
/// ticker. Implementations return the closes from `start_date` to the latest
/// available bar, ascending, or a distinguishable error: `DataRetrieval` for
/// transport and lookup failures, `NoData` for an empty result,
/// `InvalidPriceHistory` for malformed series. Never a partial series.
pub trait DataPort: Send + Sync {
    fn fetch_history(
        &self,
        code: &str,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<PriceHistory, SignalError>;
}

impl<T: DataPort + ?Sized> DataPort for Box<T> {
    fn fetch_history(
        &self,
        code: &str,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<PriceHistory, SignalError> {
        (**self).fetch_history(code, symbol, start_date)
    }
}
