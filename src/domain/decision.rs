//! Per-instrument decisions and the holding-state input.

use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::strategy::{Action, Regime, Signal};
use std::collections::HashMap;

/// Caller-supplied "currently holding" flags. Unknown codes are not held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldingState {
    held: HashMap<String, bool>,
}

impl HoldingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, code: &str, holding: bool) {
        self.held.insert(code.to_uppercase(), holding);
    }

    pub fn with(mut self, code: &str, holding: bool) -> Self {
        self.set(code, holding);
        self
    }

    pub fn is_holding(&self, code: &str) -> bool {
        self.held
            .get(&code.to_uppercase())
            .copied()
            .unwrap_or(false)
    }

    pub fn held_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .held
            .iter()
            .filter(|(_, held)| **held)
            .map(|(code, _)| code.as_str())
            .collect();
        codes.sort();
        codes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub code: String,
    pub name: String,
    pub holding: bool,
    pub action: Action,
    pub regime: Option<Regime>,
    pub reason: String,
    pub snapshot: IndicatorSnapshot,
}

impl Decision {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        holding: bool,
        signal: Signal,
        snapshot: IndicatorSnapshot,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            holding,
            action: signal.action,
            regime: signal.regime,
            reason: signal.reason,
            snapshot,
        }
    }
}

/// An instrument that produced no decision this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Unavailable {
    pub code: String,
    pub name: String,
    pub reason: String,
}
