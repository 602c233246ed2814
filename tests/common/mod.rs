#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use dualsignal::domain::error::SignalError;
use dualsignal::domain::instrument::InstrumentConfig;
pub use dualsignal::domain::price_history::{PriceHistory, PricePoint};
use dualsignal::domain::strategy::{DisparityBand, StrategyRule, TrendZScore};
use dualsignal::ports::data_port::DataPort;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory data port. Unknown codes return `NoData`; codes registered with
/// `with_error` return `DataRetrieval`.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
    requests: Mutex<Vec<(String, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_closes(mut self, code: &str, closes: &[f64]) -> Self {
        self.data.insert(code.to_string(), points(start_date(), closes));
        self
    }

    pub fn with_points(mut self, code: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(code.to_string(), points);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    /// Codes requested so far with their start dates, in call order.
    pub fn requests(&self) -> Vec<(String, NaiveDate)> {
        self.requests.lock().unwrap().clone()
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        code: &str,
        _symbol: &str,
        start_date: NaiveDate,
    ) -> Result<PriceHistory, SignalError> {
        self.requests
            .lock()
            .unwrap()
            .push((code.to_string(), start_date));

        if let Some(reason) = self.errors.get(code) {
            return Err(SignalError::DataRetrieval {
                code: code.to_string(),
                reason: reason.clone(),
            });
        }
        let points: Vec<PricePoint> = self
            .data
            .get(code)
            .map(|p| p.iter().copied().filter(|p| p.date >= start_date).collect())
            .unwrap_or_default();
        if points.is_empty() {
            return Err(SignalError::NoData {
                code: code.to_string(),
            });
        }
        PriceHistory::new(code, points)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// First bar of every generated series.
pub fn start_date() -> NaiveDate {
    date(2024, 1, 1)
}

/// One bar per calendar day from `start`.
pub fn points(start: NaiveDate, closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + Duration::days(i as i64),
            close,
        })
        .collect()
}

/// Date of the last bar of a series of `len` bars built by `points(start_date(), ..)`.
pub fn last_date(len: usize) -> NaiveDate {
    start_date() + Duration::days(len as i64 - 1)
}

pub fn flat(n: usize, price: f64) -> Vec<f64> {
    vec![price; n]
}

pub fn rising(n: usize, start: f64, step: f64) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Appends the close that puts the latest bar at disparity `target` against
/// a `window`-bar MA that includes it.
pub fn with_final_disparity(mut closes: Vec<f64>, window: usize, target: f64) -> Vec<f64> {
    let prior: f64 = closes[closes.len() - (window - 1)..].iter().sum();
    let close = target * prior / (100.0 * window as f64 - target);
    closes.push(close);
    closes
}

pub fn disparity_instrument(code: &str) -> InstrumentConfig {
    InstrumentConfig::new(code, StrategyRule::DisparityBand(DisparityBand::default()))
}

pub fn bear_only_instrument(code: &str) -> InstrumentConfig {
    InstrumentConfig::new(
        code,
        StrategyRule::DisparityBand(DisparityBand {
            bull: None,
            ..DisparityBand::default()
        }),
    )
}

pub fn zscore_instrument(code: &str) -> InstrumentConfig {
    InstrumentConfig::new(code, StrategyRule::TrendZScore(TrendZScore::default()))
}
