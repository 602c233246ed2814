//! Least-squares trend line and residual z-score.
//!
//! Fits close = intercept + slope * x over the trailing `window` closes with
//! x = 0..window-1, then measures the latest close against the fitted value in
//! units of the population standard deviation of the residuals:
//!
//!   z = (C[last] - fitted[last]) / stddev(C - fitted)
//!
//! A series whose residual deviation is zero (or lost in rounding noise
//! relative to the price level) has z = 0.

use crate::domain::error::SignalError;

/// Residual deviation at or below this fraction of the fitted price counts as zero.
const DEGENERATE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    pub fitted_last: f64,
    pub residual_std: f64,
    pub z_score: f64,
}

impl RegressionFit {
    pub fn is_degenerate(&self) -> bool {
        self.residual_std <= DEGENERATE_TOLERANCE * self.fitted_last.abs()
    }
}

pub fn regression_z_score(closes: &[f64], window: usize) -> Result<RegressionFit, SignalError> {
    if window < 2 || closes.len() < window {
        return Err(SignalError::InsufficientData {
            code: String::new(),
            bars: closes.len(),
            minimum: window.max(2),
        });
    }

    let ys = &closes[closes.len() - window..];
    let n = window as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, &y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxx += dx * dx;
        sxy += dx * (y - y_mean);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let variance = ys
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            let residual = y - (intercept + slope * i as f64);
            residual * residual
        })
        .sum::<f64>()
        / n;
    let residual_std = variance.sqrt();

    let fitted_last = intercept + slope * (n - 1.0);
    let latest = ys[window - 1];

    let mut fit = RegressionFit {
        slope,
        intercept,
        fitted_last,
        residual_std,
        z_score: 0.0,
    };
    if !fit.is_degenerate() {
        fit.z_score = (latest - fitted_last) / residual_std;
    }
    Ok(fit)
}
