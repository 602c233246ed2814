//! Configuration validation.
//!
//! Validates every config field before a cycle runs, so a bad threshold is
//! reported as a config error instead of surfacing as a strange signal.

use crate::domain::error::SignalError;
use crate::domain::instrument::{instrument_section, parse_codes};
use crate::domain::strategy::{DisparityBand, TrendZScore};
use crate::ports::config_port::{ConfigPort, parse_bool};

pub const STRATEGY_NAMES: [&str; 2] = ["disparity_band", "trend_zscore"];
pub const PROVIDER_NAMES: [&str; 2] = ["yahoo", "csv"];

/// Longest accepted price lookback, roughly a century of calendar days.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let codes = validate_instruments(config)?;
    for code in &codes {
        validate_instrument(config, code)?;
    }
    validate_lookback(config)?;
    validate_provider(config)?;
    validate_timeouts(config)?;
    validate_parking(config)?;
    validate_holdings(config, &codes)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalError {
    SignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present values must parse; absent ones fall back to the default later.
fn validate_numeric(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SignalError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<f64>().is_err() => Err(invalid(
            section,
            key,
            format!("{} is not a number: {:?}", key, raw),
        )),
        _ => Ok(()),
    }
}

/// Windows, day counts and timeouts are read as integers; `20.5` must not
/// validate and then fall back to the default.
fn validate_integer(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SignalError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<i64>().is_err() => Err(invalid(
            section,
            key,
            format!("{} is not a whole number: {:?}", key, raw),
        )),
        _ => Ok(()),
    }
}

fn validate_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SignalError> {
    match config.get_string(section, key) {
        Some(raw) if parse_bool(&raw).is_none() => Err(invalid(
            section,
            key,
            format!("{} is not a boolean: {:?}", key, raw),
        )),
        _ => Ok(()),
    }
}

fn validate_instruments(config: &dyn ConfigPort) -> Result<Vec<String>, SignalError> {
    let raw = match config.get_string("engine", "instruments") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(SignalError::ConfigMissing {
                section: "engine".to_string(),
                key: "instruments".to_string(),
            })
        }
    };
    parse_codes(&raw).map_err(|e| invalid("engine", "instruments", e.to_string()))
}

fn validate_instrument(config: &dyn ConfigPort, code: &str) -> Result<(), SignalError> {
    let section = instrument_section(code);
    let strategy = match config.get_string(&section, "strategy") {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => {
            return Err(SignalError::ConfigMissing {
                section,
                key: "strategy".to_string(),
            })
        }
    };

    match strategy.as_str() {
        "disparity_band" => validate_disparity_band(config, &section),
        "trend_zscore" => validate_trend_zscore(config, &section),
        other => Err(invalid(
            &section,
            "strategy",
            format!(
                "unknown strategy '{}', expected one of: {}",
                other,
                STRATEGY_NAMES.join(", ")
            ),
        )),
    }
}

fn validate_disparity_band(config: &dyn ConfigPort, section: &str) -> Result<(), SignalError> {
    validate_integer(config, section, "ma_window")?;
    for key in [
        "entry_bull",
        "exit_bull",
        "entry_bear",
        "exit_bear_profit",
        "exit_bear_loss",
    ] {
        validate_numeric(config, section, key)?;
    }
    validate_bool(config, section, "bull_leg")?;

    let defaults = DisparityBand::default();
    if config.get_int(section, "ma_window", defaults.ma_window as i64) < 1 {
        return Err(invalid(section, "ma_window", "ma_window must be at least 1"));
    }

    let has_entry = config.has(section, "entry_bull");
    let has_exit = config.has(section, "exit_bull");
    if has_entry != has_exit {
        let missing = if has_entry { "exit_bull" } else { "entry_bull" };
        return Err(invalid(
            section,
            missing,
            "entry_bull and exit_bull must be set together",
        ));
    }
    if config.get_bool(section, "bull_leg", true) {
        if let Some(leg) = defaults.bull {
            let entry = config.get_double(section, "entry_bull", leg.entry);
            let exit = config.get_double(section, "exit_bull", leg.exit);
            if exit > entry {
                return Err(invalid(
                    section,
                    "exit_bull",
                    "exit_bull must not exceed entry_bull",
                ));
            }
        }
    } else if has_entry {
        return Err(invalid(
            section,
            "bull_leg",
            "bull thresholds are set but bull_leg is false",
        ));
    }

    let entry_bear = config.get_double(section, "entry_bear", defaults.entry_bear);
    let profit = config.get_double(section, "exit_bear_profit", defaults.exit_bear_profit);
    let loss = config.get_double(section, "exit_bear_loss", defaults.exit_bear_loss);
    if loss >= profit {
        return Err(invalid(
            section,
            "exit_bear_loss",
            "exit_bear_loss must be below exit_bear_profit",
        ));
    }
    if loss >= entry_bear {
        return Err(invalid(
            section,
            "exit_bear_loss",
            "exit_bear_loss must be below entry_bear",
        ));
    }
    Ok(())
}

fn validate_trend_zscore(config: &dyn ConfigPort, section: &str) -> Result<(), SignalError> {
    for key in ["regression_window", "trend_window"] {
        validate_integer(config, section, key)?;
    }
    for key in ["entry_depth", "exit_level"] {
        validate_numeric(config, section, key)?;
    }

    let defaults = TrendZScore::default();
    if config.get_int(section, "regression_window", defaults.regression_window as i64) < 2 {
        return Err(invalid(
            section,
            "regression_window",
            "regression_window must be at least 2",
        ));
    }
    if config.get_int(section, "trend_window", defaults.trend_window as i64) < 1 {
        return Err(invalid(
            section,
            "trend_window",
            "trend_window must be at least 1",
        ));
    }

    let entry = config.get_double(section, "entry_depth", defaults.entry_depth);
    let exit = config.get_double(section, "exit_level", defaults.exit_level);
    if entry >= exit {
        return Err(invalid(
            section,
            "entry_depth",
            "entry_depth must be below exit_level",
        ));
    }
    Ok(())
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), SignalError> {
    validate_integer(config, "engine", "lookback_days")?;
    let days = config.get_int("engine", "lookback_days", 365);
    if days <= 0 {
        return Err(invalid(
            "engine",
            "lookback_days",
            "lookback_days must be positive",
        ));
    }
    if days > MAX_LOOKBACK_DAYS {
        return Err(invalid(
            "engine",
            "lookback_days",
            format!("lookback_days must not exceed {}", MAX_LOOKBACK_DAYS),
        ));
    }
    Ok(())
}

fn validate_provider(config: &dyn ConfigPort) -> Result<(), SignalError> {
    let provider = config
        .get_string("engine", "provider")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "yahoo".to_string());

    match provider.as_str() {
        "yahoo" => Ok(()),
        "csv" if config.has("engine", "csv_dir") => Ok(()),
        "csv" => Err(SignalError::ConfigMissing {
            section: "engine".to_string(),
            key: "csv_dir".to_string(),
        }),
        other => Err(invalid(
            "engine",
            "provider",
            format!(
                "unknown provider '{}', expected one of: {}",
                other,
                PROVIDER_NAMES.join(", ")
            ),
        )),
    }
}

fn validate_timeouts(config: &dyn ConfigPort) -> Result<(), SignalError> {
    for key in ["timeout_secs", "cache_ttl_secs"] {
        validate_integer(config, "engine", key)?;
        if config.get_int("engine", key, 1) <= 0 {
            return Err(invalid("engine", key, format!("{} must be positive", key)));
        }
    }
    Ok(())
}

fn validate_parking(config: &dyn ConfigPort) -> Result<(), SignalError> {
    if !config.has("parking", "code") {
        return Ok(());
    }
    validate_integer(config, "parking", "trend_window")?;
    if config.get_int("parking", "trend_window", 60) < 1 {
        return Err(invalid(
            "parking",
            "trend_window",
            "trend_window must be at least 1",
        ));
    }
    Ok(())
}

fn validate_holdings(config: &dyn ConfigPort, codes: &[String]) -> Result<(), SignalError> {
    for key in config.keys("holdings") {
        let code = key.to_uppercase();
        if !codes.contains(&code) {
            return Err(invalid(
                "holdings",
                &key,
                format!("{} is not in engine.instruments", code),
            ));
        }
        validate_bool(config, "holdings", &key)?;
    }
    Ok(())
}
