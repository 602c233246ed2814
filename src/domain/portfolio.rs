//! Portfolio-level aggregation of per-instrument decisions.
//!
//! Exits become sells, entries become equal-weight buys, and leftover cash is
//! parked in the parking instrument only while its own long moving average is
//! rising. The parking choice ignores every other decision.

use crate::domain::decision::Decision;
use crate::domain::strategy::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct BuyInstruction {
    pub code: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParkingInstruction {
    AllocateToParkingAsset { code: String },
    HoldCash,
}

/// Trend state of the parking instrument, computed like any long-MA filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingTrend {
    pub code: String,
    pub long_ma: f64,
    pub long_ma_prev: f64,
    pub trend_up: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRecommendation {
    pub sells: Vec<String>,
    pub buys: Vec<BuyInstruction>,
    pub parking: ParkingInstruction,
}

impl PortfolioRecommendation {
    pub fn has_trades(&self) -> bool {
        !self.sells.is_empty() || !self.buys.is_empty()
    }
}

pub fn aggregate(decisions: &[Decision], parking: Option<&ParkingTrend>) -> PortfolioRecommendation {
    let sells: Vec<String> = decisions
        .iter()
        .filter(|d| d.action.is_exit())
        .map(|d| d.code.clone())
        .collect();

    let entering: Vec<&Decision> = decisions
        .iter()
        .filter(|d| d.action == Action::EnterLong)
        .collect();

    let buys = if entering.is_empty() {
        Vec::new()
    } else {
        let weight = 1.0 / entering.len() as f64;
        entering
            .iter()
            .map(|d| BuyInstruction {
                code: d.code.clone(),
                weight,
            })
            .collect()
    };

    let parking = match parking {
        Some(p) if p.trend_up => ParkingInstruction::AllocateToParkingAsset {
            code: p.code.clone(),
        },
        _ => ParkingInstruction::HoldCash,
    };

    PortfolioRecommendation {
        sells,
        buys,
        parking,
    }
}
