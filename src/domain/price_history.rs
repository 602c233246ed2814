//! Daily closing-price history for one instrument.

use crate::domain::error::SignalError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closes in strictly ascending date order, every close positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    code: String,
    points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn new(code: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SignalError> {
        let code = code.into();

        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(SignalError::InvalidPriceHistory {
                    code,
                    reason: format!("non-positive close {} on {}", point.close, point.date),
                });
            }
            if i > 0 && points[i - 1].date >= point.date {
                return Err(SignalError::InvalidPriceHistory {
                    code,
                    reason: format!(
                        "dates not strictly ascending at {} (previous {})",
                        point.date,
                        points[i - 1].date
                    ),
                });
            }
        }

        Ok(Self { code, points })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Points dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        Self {
            code: self.code.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start)
                .copied()
                .collect(),
        }
    }

    /// Points dated on or before `end`.
    pub fn until(&self, end: NaiveDate) -> Self {
        Self {
            code: self.code.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.date <= end)
                .copied()
                .collect(),
        }
    }
}
