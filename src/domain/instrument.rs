//! Instrument configuration and code-list parsing.

use crate::domain::strategy::StrategyRule;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentConfig {
    pub code: String,
    pub name: String,
    /// Provider-side symbol, e.g. `122630.KS`.
    pub symbol: String,
    pub rule: StrategyRule,
}

impl InstrumentConfig {
    pub fn new(code: &str, rule: StrategyRule) -> Self {
        Self {
            code: code.to_string(),
            name: code.to_string(),
            symbol: code.to_string(),
            rule,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.to_string();
        self
    }
}

/// Fallback instrument for idle cash, gated only by its own trend filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingConfig {
    pub code: String,
    pub symbol: String,
    pub trend_window: usize,
}

/// Config section holding one instrument's settings, e.g. `[instrument.KODEX_LEV]`.
pub fn instrument_section(code: &str) -> String {
    format!("instrument.{}", code)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CodeListError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, CodeListError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CodeListError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(CodeListError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}
