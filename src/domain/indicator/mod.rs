//! Indicator calculations over closing prices.
//!
//! - `moving_average`: trailing arithmetic mean
//! - `disparity`: latest close as a percentage of a moving average
//! - `trend_up` / `long_ma_pair`: one-bar momentum of the long moving average
//! - [`regression`]: least-squares fit and residual z-score
//!
//! All functions work on the trailing end of the series; the latest bar is last.

pub mod regression;

use crate::domain::error::SignalError;
use chrono::NaiveDate;
use std::fmt;

/// The deviation metric a rule compares against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deviation {
    /// Close / MA * 100.
    Disparity(f64),
    /// Residual z-score against the regression line.
    ZScore(f64),
}

impl Deviation {
    pub fn value(&self) -> f64 {
        match self {
            Deviation::Disparity(v) | Deviation::ZScore(v) => *v,
        }
    }
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deviation::Disparity(d) => write!(f, "disparity {:.2}%", d),
            Deviation::ZScore(z) => write!(f, "z-score {:.2}", z),
        }
    }
}

/// Indicator values for one instrument on its latest bar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub latest_close: f64,
    pub long_ma: f64,
    pub long_ma_prev: f64,
    pub trend_up: bool,
    pub deviation: Deviation,
    pub slope: Option<f64>,
}

/// Today's and yesterday's long-window moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFilter {
    pub today: f64,
    pub yesterday: f64,
}

impl TrendFilter {
    pub fn is_up(&self) -> bool {
        trend_up(self.today, self.yesterday)
    }
}

pub fn moving_average(closes: &[f64], window: usize) -> Result<f64, SignalError> {
    if window == 0 || closes.len() < window {
        return Err(SignalError::InsufficientData {
            code: String::new(),
            bars: closes.len(),
            minimum: window.max(1),
        });
    }
    let tail = &closes[closes.len() - window..];
    Ok(tail.iter().sum::<f64>() / window as f64)
}

pub fn disparity(latest_close: f64, moving_average: f64) -> Result<f64, SignalError> {
    if moving_average == 0.0 {
        return Err(SignalError::DivisionByZero {
            what: "disparity".into(),
        });
    }
    Ok(latest_close / moving_average * 100.0)
}

/// Strictly rising: a flat average is not an up-trend.
pub fn trend_up(long_ma_today: f64, long_ma_yesterday: f64) -> bool {
    long_ma_today > long_ma_yesterday
}

/// Needs `window + 1` bars so that yesterday's average is a full window too.
pub fn long_ma_pair(closes: &[f64], window: usize) -> Result<TrendFilter, SignalError> {
    if window == 0 || closes.len() < window + 1 {
        return Err(SignalError::InsufficientData {
            code: String::new(),
            bars: closes.len(),
            minimum: window + 1,
        });
    }
    let today = moving_average(closes, window)?;
    let yesterday = moving_average(&closes[..closes.len() - 1], window)?;
    Ok(TrendFilter { today, yesterday })
}
