//! Strategy rules mapping indicator values and holding state to an action.
//!
//! Two closed variants share one surface (`required_bars`, `compute_indicators`,
//! `decide`):
//! - [`DisparityBand`]: trend-following bull leg plus counter-trend bear leg on
//!   the disparity to a single moving average.
//! - [`TrendZScore`]: buy pullbacks below a regression line while the long
//!   moving average is rising; the trend filter is a hard stop.
//!
//! Exit checks run in priority order. Regime-change exits (bull exit, broken
//! trend filter) are evaluated before profit-taking and stop-loss levels.
//! Comparisons are exactly as written: `<` is strict, `>=`/`<=` are inclusive.

use crate::domain::error::SignalError;
use crate::domain::indicator::regression::regression_z_score;
use crate::domain::indicator::{Deviation, IndicatorSnapshot, disparity, long_ma_pair};
use crate::domain::price_history::PriceHistory;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Hold,
    EnterLong,
    ExitProfitTarget,
    ExitStopLoss,
    ExitTrendBroken,
    NoAction,
}

impl Action {
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            Action::ExitProfitTarget | Action::ExitStopLoss | Action::ExitTrendBroken
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Hold => "HOLD",
            Action::EnterLong => "BUY",
            Action::ExitProfitTarget => "SELL (profit target)",
            Action::ExitStopLoss => "SELL (stop loss)",
            Action::ExitTrendBroken => "SELL (trend broken)",
            Action::NoAction => "WAIT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which leg of a rule produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regime {
    TrendFollowing,
    MeanReversion,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::TrendFollowing => write!(f, "trend-following"),
            Regime::MeanReversion => write!(f, "mean-reversion"),
        }
    }
}

/// Output of a rule: the action, the entry regime when entering, and a reason line.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub action: Action,
    pub regime: Option<Regime>,
    pub reason: String,
}

impl Signal {
    fn new(action: Action, reason: String) -> Self {
        Self {
            action,
            regime: None,
            reason,
        }
    }

    fn enter(regime: Regime, reason: String) -> Self {
        Self {
            action: Action::EnterLong,
            regime: Some(regime),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BullLeg {
    pub entry: f64,
    pub exit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisparityBand {
    pub ma_window: usize,
    /// `None` makes the band counter-trend only.
    pub bull: Option<BullLeg>,
    pub entry_bear: f64,
    pub exit_bear_profit: f64,
    pub exit_bear_loss: f64,
}

impl Default for DisparityBand {
    fn default() -> Self {
        Self {
            ma_window: 60,
            bull: Some(BullLeg {
                entry: 104.0,
                exit: 100.0,
            }),
            entry_bear: 95.0,
            exit_bear_profit: 98.0,
            exit_bear_loss: 85.0,
        }
    }
}

impl DisparityBand {
    pub fn decide(&self, d: f64, trend_up: bool, holding: bool) -> Signal {
        if holding {
            if let Some(bull) = self.bull {
                if d < bull.exit {
                    return Signal::new(
                        Action::ExitTrendBroken,
                        format!("disparity {:.2} below bull exit {}", d, bull.exit),
                    );
                }
            }
            if d >= self.exit_bear_profit {
                Signal::new(
                    Action::ExitProfitTarget,
                    format!("disparity {:.2} reached target {}", d, self.exit_bear_profit),
                )
            } else if d < self.exit_bear_loss {
                Signal::new(
                    Action::ExitStopLoss,
                    format!("disparity {:.2} broke stop {}", d, self.exit_bear_loss),
                )
            } else {
                Signal::new(
                    Action::Hold,
                    format!(
                        "disparity {:.2} between stop {} and target {}",
                        d, self.exit_bear_loss, self.exit_bear_profit
                    ),
                )
            }
        } else {
            if let Some(bull) = self.bull {
                if d >= bull.entry && trend_up {
                    return Signal::enter(
                        Regime::TrendFollowing,
                        format!("disparity {:.2} at or above {} with rising MA", d, bull.entry),
                    );
                }
            }
            if d < self.entry_bear {
                Signal::enter(
                    Regime::MeanReversion,
                    format!("disparity {:.2} oversold below {}", d, self.entry_bear),
                )
            } else {
                Signal::new(
                    Action::NoAction,
                    format!("disparity {:.2} outside entry bands", d),
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendZScore {
    pub regression_window: usize,
    pub trend_window: usize,
    pub entry_depth: f64,
    pub exit_level: f64,
}

impl Default for TrendZScore {
    fn default() -> Self {
        Self {
            regression_window: 20,
            trend_window: 60,
            entry_depth: -1.7,
            exit_level: 0.3,
        }
    }
}

impl TrendZScore {
    pub fn decide(&self, z: f64, slope: f64, trend_up: bool, holding: bool) -> Signal {
        if holding {
            if !trend_up {
                Signal::new(
                    Action::ExitTrendBroken,
                    format!("{}-bar MA turned down", self.trend_window),
                )
            } else if z >= self.exit_level {
                Signal::new(
                    Action::ExitProfitTarget,
                    format!("z-score {:.2} reached exit {}", z, self.exit_level),
                )
            } else {
                Signal::new(
                    Action::Hold,
                    format!("z-score {:.2} below exit {}", z, self.exit_level),
                )
            }
        } else if trend_up && slope > 0.0 && z <= self.entry_depth {
            Signal::enter(
                Regime::MeanReversion,
                format!("z-score {:.2} at or below {} in up-trend", z, self.entry_depth),
            )
        } else if !trend_up || slope <= 0.0 {
            Signal::new(Action::NoAction, "no up-trend".to_string())
        } else {
            Signal::new(
                Action::NoAction,
                format!("z-score {:.2} above entry {}", z, self.entry_depth),
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyRule {
    DisparityBand(DisparityBand),
    TrendZScore(TrendZScore),
}

impl StrategyRule {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyRule::DisparityBand(_) => "disparity_band",
            StrategyRule::TrendZScore(_) => "trend_zscore",
        }
    }

    pub fn required_bars(&self) -> usize {
        match self {
            StrategyRule::DisparityBand(rule) => rule.ma_window + 1,
            StrategyRule::TrendZScore(rule) => (rule.trend_window + 1).max(rule.regression_window),
        }
    }

    pub fn compute_indicators(
        &self,
        history: &PriceHistory,
    ) -> Result<IndicatorSnapshot, SignalError> {
        let code = history.code();
        let (date, latest_close) = match history.latest() {
            Some(p) if history.len() >= self.required_bars() => (p.date, p.close),
            _ => {
                return Err(SignalError::InsufficientData {
                    code: code.to_string(),
                    bars: history.len(),
                    minimum: self.required_bars(),
                });
            }
        };
        let closes = history.closes();

        match self {
            StrategyRule::DisparityBand(rule) => {
                let filter = long_ma_pair(&closes, rule.ma_window).map_err(|e| e.for_code(code))?;
                let d = disparity(latest_close, filter.today)?;
                Ok(IndicatorSnapshot {
                    date,
                    latest_close,
                    long_ma: filter.today,
                    long_ma_prev: filter.yesterday,
                    trend_up: filter.is_up(),
                    deviation: Deviation::Disparity(d),
                    slope: None,
                })
            }
            StrategyRule::TrendZScore(rule) => {
                let filter =
                    long_ma_pair(&closes, rule.trend_window).map_err(|e| e.for_code(code))?;
                let fit = regression_z_score(&closes, rule.regression_window)
                    .map_err(|e| e.for_code(code))?;
                Ok(IndicatorSnapshot {
                    date,
                    latest_close,
                    long_ma: filter.today,
                    long_ma_prev: filter.yesterday,
                    trend_up: filter.is_up(),
                    deviation: Deviation::ZScore(fit.z_score),
                    slope: Some(fit.slope),
                })
            }
        }
    }

    pub fn decide(&self, snapshot: &IndicatorSnapshot, holding: bool) -> Signal {
        let value = snapshot.deviation.value();
        match self {
            StrategyRule::DisparityBand(rule) => rule.decide(value, snapshot.trend_up, holding),
            StrategyRule::TrendZScore(rule) => rule.decide(
                value,
                snapshot.slope.unwrap_or(0.0),
                snapshot.trend_up,
                holding,
            ),
        }
    }
}

impl fmt::Display for StrategyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyRule::DisparityBand(rule) => {
                write!(f, "DISPARITY_BAND(ma={}", rule.ma_window)?;
                if let Some(bull) = rule.bull {
                    write!(f, ", bull {}/{}", bull.entry, bull.exit)?;
                }
                write!(
                    f,
                    ", bear <{} target {} stop {})",
                    rule.entry_bear, rule.exit_bear_profit, rule.exit_bear_loss
                )
            }
            StrategyRule::TrendZScore(rule) => write!(
                f,
                "TREND_ZSCORE(reg={}, trend={}, entry<={}, exit>={})",
                rule.regression_window, rule.trend_window, rule.entry_depth, rule.exit_level
            ),
        }
    }
}
