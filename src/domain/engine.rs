//! Decision engine: one evaluation cycle across all configured instruments.
//!
//! Each instrument is fetched, measured and decided independently on the rayon
//! pool. A failure (retrieval error, short history) removes only that
//! instrument from the cycle; it is reported as unavailable and never
//! replaced by a guessed decision. Output order follows configuration order.

use crate::domain::decision::{Decision, HoldingState, Unavailable};
use crate::domain::error::SignalError;
use crate::domain::indicator::long_ma_pair;
use crate::domain::instrument::{InstrumentConfig, ParkingConfig};
use crate::domain::portfolio::{ParkingTrend, PortfolioRecommendation, aggregate};
use crate::ports::data_port::DataPort;
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub instruments: Vec<InstrumentConfig>,
    pub parking: Option<ParkingConfig>,
    pub lookback_days: i64,
}

impl EngineConfig {
    pub fn new(instruments: Vec<InstrumentConfig>) -> Self {
        Self {
            instruments,
            parking: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_parking(mut self, parking: ParkingConfig) -> Self {
        self.parking = Some(parking);
        self
    }

    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decisions: Vec<Decision>,
    pub unavailable: Vec<Unavailable>,
}

/// Everything the presentation layer needs for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub as_of: NaiveDate,
    pub decisions: Vec<Decision>,
    pub unavailable: Vec<Unavailable>,
    pub parking: Option<ParkingTrend>,
    pub recommendation: PortfolioRecommendation,
}

pub struct DecisionEngine<'a> {
    config: &'a EngineConfig,
    data_port: &'a dyn DataPort,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(config: &'a EngineConfig, data_port: &'a dyn DataPort) -> Self {
        Self { config, data_port }
    }

    /// First date requested from the data port. A lookback reaching past the
    /// calendar's range is a config error, not a panic.
    pub fn start_date(&self, as_of: NaiveDate) -> Result<NaiveDate, SignalError> {
        let days = self.config.lookback_days;
        Duration::try_days(days)
            .and_then(|span| as_of.checked_sub_signed(span))
            .ok_or_else(|| SignalError::ConfigInvalid {
                section: "engine".to_string(),
                key: "lookback_days".to_string(),
                reason: format!("{} days before {} is out of range", days, as_of),
            })
    }

    pub fn evaluate_instrument(
        &self,
        instrument: &InstrumentConfig,
        holding: bool,
        as_of: NaiveDate,
    ) -> Result<Decision, SignalError> {
        let history = self
            .data_port
            .fetch_history(&instrument.code, &instrument.symbol, self.start_date(as_of)?)?
            .until(as_of);

        let snapshot = instrument.rule.compute_indicators(&history)?;
        let signal = instrument.rule.decide(&snapshot, holding);

        tracing::debug!(
            code = %instrument.code,
            close = snapshot.latest_close,
            long_ma = snapshot.long_ma,
            trend_up = snapshot.trend_up,
            deviation = %snapshot.deviation,
            action = %signal.action,
            "instrument evaluated"
        );

        Ok(Decision::new(
            &instrument.code,
            &instrument.name,
            holding,
            signal,
            snapshot,
        ))
    }

    pub fn evaluate(&self, holdings: &HoldingState, as_of: NaiveDate) -> Evaluation {
        let results: Vec<(&InstrumentConfig, Result<Decision, SignalError>)> = self
            .config
            .instruments
            .par_iter()
            .map(|inst| {
                let holding = holdings.is_holding(&inst.code);
                (inst, self.evaluate_instrument(inst, holding, as_of))
            })
            .collect();

        let mut decisions = Vec::with_capacity(results.len());
        let mut unavailable = Vec::new();

        for (inst, result) in results {
            match result {
                Ok(decision) => decisions.push(decision),
                Err(e) => {
                    tracing::warn!(code = %inst.code, "skipping instrument: {e}");
                    unavailable.push(Unavailable {
                        code: inst.code.clone(),
                        name: inst.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Evaluation {
            decisions,
            unavailable,
        }
    }

    pub fn parking_trend(&self, as_of: NaiveDate) -> Result<Option<ParkingTrend>, SignalError> {
        let Some(parking) = &self.config.parking else {
            return Ok(None);
        };

        let history = self
            .data_port
            .fetch_history(&parking.code, &parking.symbol, self.start_date(as_of)?)?
            .until(as_of);
        let filter = long_ma_pair(&history.closes(), parking.trend_window)
            .map_err(|e| e.for_code(&parking.code))?;

        Ok(Some(ParkingTrend {
            code: parking.code.clone(),
            long_ma: filter.today,
            long_ma_prev: filter.yesterday,
            trend_up: filter.is_up(),
        }))
    }

    pub fn run_cycle(&self, holdings: &HoldingState, as_of: NaiveDate) -> CycleReport {
        tracing::info!(
            instruments = self.config.instruments.len(),
            %as_of,
            "starting evaluation cycle"
        );

        let evaluation = self.evaluate(holdings, as_of);

        // Fetched after the fan-out so a code shared with an instrument hits the cache.
        let parking = match self.parking_trend(as_of) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("parking trend unavailable, holding cash: {e}");
                None
            }
        };

        let recommendation = aggregate(&evaluation.decisions, parking.as_ref());

        tracing::info!(
            decided = evaluation.decisions.len(),
            unavailable = evaluation.unavailable.len(),
            sells = recommendation.sells.len(),
            buys = recommendation.buys.len(),
            trades = recommendation.has_trades(),
            "evaluation cycle complete"
        );

        CycleReport {
            as_of,
            decisions: evaluation.decisions,
            unavailable: evaluation.unavailable,
            parking,
            recommendation,
        }
    }
}
