//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::cached_data_adapter::CachedDataAdapter;
use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::validate_engine_config;
use crate::domain::decision::HoldingState;
use crate::domain::engine::{CycleReport, DecisionEngine, EngineConfig, DEFAULT_LOOKBACK_DAYS};
use crate::domain::error::SignalError;
use crate::domain::instrument::{instrument_section, parse_codes, InstrumentConfig, ParkingConfig};
use crate::domain::strategy::{BullLeg, DisparityBand, StrategyRule, TrendZScore};
use crate::ports::config_port::{ConfigPort, parse_bool};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[cfg(feature = "yahoo")]
const DEFAULT_TIMEOUT_SECS: i64 = 10;
const DEFAULT_PARKING_TREND_WINDOW: i64 = 60;

#[derive(Parser, Debug)]
#[command(name = "dualsignal", about = "Daily long/flat signals for leveraged index ETFs")]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one evaluation cycle and print the report
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        /// Mark an instrument as currently held (repeatable)
        #[arg(long = "hold", value_name = "CODE")]
        hold: Vec<String>,
        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Bypass the price cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate a configuration and list the configured rules
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    match cli.command {
        Command::Evaluate {
            config,
            hold,
            as_of,
            no_cache,
        } => run_evaluate(&config, &hold, as_of, no_cache),
        Command::Validate { config } => run_validate(&config),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests driving `run` twice) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn fail(err: SignalError) -> ExitCode {
    tracing::error!("{err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SignalError> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn run_evaluate(
    config_path: &Path,
    hold: &[String],
    as_of: Option<NaiveDate>,
    no_cache: bool,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if let Err(e) = validate_engine_config(&adapter) {
        return fail(e);
    }

    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let holdings = match build_holdings(&adapter, hold) {
        Ok(h) => h,
        Err(e) => return fail(e),
    };
    tracing::info!(held = ?holdings.held_codes(), "holdings loaded");

    let data_port = match build_data_port(&adapter, no_cache) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut stdout = std::io::stdout().lock();

    match run_evaluate_pipeline(&*data_port, &engine_config, &holdings, as_of, &mut stdout) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

/// Runs one cycle against `data_port` and writes the console report to `out`.
pub fn run_evaluate_pipeline(
    data_port: &dyn DataPort,
    engine_config: &EngineConfig,
    holdings: &HoldingState,
    as_of: NaiveDate,
    out: &mut dyn Write,
) -> Result<CycleReport, SignalError> {
    let engine = DecisionEngine::new(engine_config, data_port);
    let report = engine.run_cycle(holdings, as_of);
    ConsoleReportAdapter::new().write(&report, out)?;
    Ok(report)
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if let Err(e) = validate_engine_config(&adapter) {
        return fail(e);
    }

    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    println!("Instruments:");
    for inst in &engine_config.instruments {
        println!("  {} ({}, symbol {})", inst.name, inst.code, inst.symbol);
        println!("    rule:          {}", inst.rule);
        println!("    required bars: {}", inst.rule.required_bars());
        if trading_days(engine_config.lookback_days) < inst.rule.required_bars() {
            tracing::warn!(
                code = %inst.code,
                lookback_days = engine_config.lookback_days,
                "lookback window may hold fewer bars than the rule needs"
            );
        }
    }

    match &engine_config.parking {
        Some(p) => println!(
            "Parking: {} (symbol {}, trend window {})",
            p.code, p.symbol, p.trend_window
        ),
        None => println!("Parking: none (idle cash stays in cash)"),
    }
    println!("Lookback: {} calendar days", engine_config.lookback_days);

    println!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

/// Rough count of weekday bars in a calendar window.
fn trading_days(calendar_days: i64) -> usize {
    (calendar_days.max(0) * 5 / 7) as usize
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, SignalError> {
    let raw = config
        .get_string("engine", "instruments")
        .ok_or_else(|| SignalError::ConfigMissing {
            section: "engine".into(),
            key: "instruments".into(),
        })?;
    let codes = parse_codes(&raw).map_err(|e| SignalError::ConfigInvalid {
        section: "engine".into(),
        key: "instruments".into(),
        reason: e.to_string(),
    })?;

    let instruments = codes
        .iter()
        .map(|code| build_instrument(config, code))
        .collect::<Result<Vec<_>, _>>()?;

    let mut engine_config = EngineConfig::new(instruments)
        .with_lookback_days(config.get_int("engine", "lookback_days", DEFAULT_LOOKBACK_DAYS));

    if let Some(parking) = build_parking(config)? {
        engine_config = engine_config.with_parking(parking);
    }

    Ok(engine_config)
}

fn build_instrument(config: &dyn ConfigPort, code: &str) -> Result<InstrumentConfig, SignalError> {
    let section = instrument_section(code);
    let rule = build_rule(config, &section)?;

    let mut inst = InstrumentConfig::new(code, rule);
    if let Some(name) = config.get_string(&section, "name").filter(|s| !s.trim().is_empty()) {
        inst = inst.with_name(name.trim());
    }
    if let Some(symbol) = config.get_string(&section, "symbol").filter(|s| !s.trim().is_empty()) {
        inst = inst.with_symbol(symbol.trim());
    }
    Ok(inst)
}

fn get_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
    minimum: usize,
) -> Result<usize, SignalError> {
    let invalid = |reason: String| SignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    };
    let value = match config.get_string(section, key).filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(format!("{} is not a whole number: {:?}", key, raw)))?,
        None => default as i64,
    };
    usize::try_from(value)
        .ok()
        .filter(|v| *v >= minimum)
        .ok_or_else(|| invalid(format!("{} must be at least {}", key, minimum)))
}

pub fn build_rule(config: &dyn ConfigPort, section: &str) -> Result<StrategyRule, SignalError> {
    let strategy = config
        .get_string(section, "strategy")
        .map(|s| s.trim().to_lowercase())
        .ok_or_else(|| SignalError::ConfigMissing {
            section: section.to_string(),
            key: "strategy".into(),
        })?;

    match strategy.as_str() {
        "disparity_band" => {
            let d = DisparityBand::default();
            let bull = if config.get_bool(section, "bull_leg", true) {
                d.bull.map(|leg| BullLeg {
                    entry: config.get_double(section, "entry_bull", leg.entry),
                    exit: config.get_double(section, "exit_bull", leg.exit),
                })
            } else {
                None
            };
            Ok(StrategyRule::DisparityBand(DisparityBand {
                ma_window: get_window(config, section, "ma_window", d.ma_window, 1)?,
                bull,
                entry_bear: config.get_double(section, "entry_bear", d.entry_bear),
                exit_bear_profit: config.get_double(section, "exit_bear_profit", d.exit_bear_profit),
                exit_bear_loss: config.get_double(section, "exit_bear_loss", d.exit_bear_loss),
            }))
        }
        "trend_zscore" => {
            let t = TrendZScore::default();
            Ok(StrategyRule::TrendZScore(TrendZScore {
                regression_window: get_window(
                    config,
                    section,
                    "regression_window",
                    t.regression_window,
                    2,
                )?,
                trend_window: get_window(config, section, "trend_window", t.trend_window, 1)?,
                entry_depth: config.get_double(section, "entry_depth", t.entry_depth),
                exit_level: config.get_double(section, "exit_level", t.exit_level),
            }))
        }
        other => Err(SignalError::ConfigInvalid {
            section: section.to_string(),
            key: "strategy".into(),
            reason: format!("unknown strategy '{}'", other),
        }),
    }
}

fn build_parking(config: &dyn ConfigPort) -> Result<Option<ParkingConfig>, SignalError> {
    let Some(code) = config
        .get_string("parking", "code")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    let symbol = config
        .get_string("parking", "symbol")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| code.clone());
    let trend_window = get_window(
        config,
        "parking",
        "trend_window",
        DEFAULT_PARKING_TREND_WINDOW as usize,
        1,
    )?;

    Ok(Some(ParkingConfig {
        code,
        symbol,
        trend_window,
    }))
}

/// Holdings from the `[holdings]` section, with `--hold` flags forcing true.
/// Every code must be a configured instrument and every value a readable boolean.
pub fn build_holdings(
    config: &dyn ConfigPort,
    hold_flags: &[String],
) -> Result<HoldingState, SignalError> {
    let known = config
        .get_string("engine", "instruments")
        .and_then(|raw| parse_codes(&raw).ok())
        .unwrap_or_default();
    let unknown = |key: &str, code: String| SignalError::ConfigInvalid {
        section: "holdings".into(),
        key: key.to_string(),
        reason: format!("{} is not in engine.instruments", code),
    };

    let mut holdings = HoldingState::new();
    for key in config.keys("holdings") {
        let code = key.to_uppercase();
        if !known.contains(&code) {
            return Err(unknown(&key, code));
        }
        let raw = config.get_string("holdings", &key).unwrap_or_default();
        let held = parse_bool(&raw).ok_or_else(|| SignalError::ConfigInvalid {
            section: "holdings".into(),
            key: key.clone(),
            reason: format!("{} is not a boolean: {:?}", key, raw),
        })?;
        holdings.set(&code, held);
    }
    for flag in hold_flags {
        let code = flag.trim().to_uppercase();
        if !known.contains(&code) {
            return Err(unknown("--hold", code));
        }
        holdings.set(&code, true);
    }
    Ok(holdings)
}

pub fn build_data_port(
    config: &dyn ConfigPort,
    no_cache: bool,
) -> Result<Box<dyn DataPort>, SignalError> {
    let provider = config
        .get_string("engine", "provider")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "yahoo".to_string());

    let base: Box<dyn DataPort> = match provider.as_str() {
        "csv" => {
            let dir = config
                .get_string("engine", "csv_dir")
                .ok_or_else(|| SignalError::ConfigMissing {
                    section: "engine".into(),
                    key: "csv_dir".into(),
                })?;
            tracing::info!("reading prices from CSV files in {}", dir);
            Box::new(CsvAdapter::new(PathBuf::from(dir.trim())))
        }
        "yahoo" => yahoo_port(config)?,
        other => {
            return Err(SignalError::ConfigInvalid {
                section: "engine".into(),
                key: "provider".into(),
                reason: format!("unknown provider '{}'", other),
            })
        }
    };

    let cache_dir = config
        .get_string("engine", "cache_dir")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cache_dir {
        Some(dir) if !no_cache => {
            let ttl_secs = config.get_int(
                "engine",
                "cache_ttl_secs",
                CachedDataAdapter::<Box<dyn DataPort>>::DEFAULT_TTL.as_secs() as i64,
            );
            let ttl = Duration::from_secs(ttl_secs.max(0) as u64);
            tracing::info!("caching prices in {} (ttl {}s)", dir, ttl.as_secs());
            Ok(Box::new(CachedDataAdapter::new(base, dir, ttl)?))
        }
        _ => Ok(base),
    }
}

#[cfg(feature = "yahoo")]
fn yahoo_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, SignalError> {
    use crate::adapters::yahoo_adapter::YahooAdapter;

    let timeout_secs = config.get_int("engine", "timeout_secs", DEFAULT_TIMEOUT_SECS);
    let timeout = Duration::from_secs(timeout_secs.max(1) as u64);
    Ok(Box::new(YahooAdapter::new(timeout)?))
}

#[cfg(not(feature = "yahoo"))]
fn yahoo_port(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, SignalError> {
    Err(SignalError::ConfigInvalid {
        section: "engine".into(),
        key: "provider".into(),
        reason: "yahoo feature is required for provider = yahoo".into(),
    })
}
