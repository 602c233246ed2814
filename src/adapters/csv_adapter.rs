//! CSV file data adapter.
//!
//! Reads `<base_path>/<CODE>.csv`. The header must contain `date` (YYYY-MM-DD)
//! and `close` columns; any other columns are ignored, so exported OHLCV files
//! work unchanged.

use crate::domain::error::SignalError;
use crate::domain::price_history::{PriceHistory, PricePoint};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn retrieval_error(code: &str, reason: String) -> SignalError {
        SignalError::DataRetrieval {
            code: code.to_string(),
            reason,
        }
    }
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        code: &str,
        _symbol: &str,
        start_date: NaiveDate,
    ) -> Result<PriceHistory, SignalError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| {
            Self::retrieval_error(code, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| Self::retrieval_error(code, format!("CSV header error: {}", e)))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| Self::retrieval_error(code, format!("missing {} column", name)))
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result
                .map_err(|e| Self::retrieval_error(code, format!("CSV parse error: {}", e)))?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                Self::retrieval_error(code, format!("invalid date {:?}: {}", date_str, e))
            })?;

            if date < start_date {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| {
                Self::retrieval_error(code, format!("invalid close {:?}: {}", close_str, e))
            })?;

            points.push(PricePoint { date, close });
        }

        if points.is_empty() {
            return Err(SignalError::NoData {
                code: code.to_string(),
            });
        }

        points.sort_by_key(|p| p.date);
        PriceHistory::new(code, points)
    }
}
