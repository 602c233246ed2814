//! CLI integration tests for config loading and the evaluate command.
//!
//! Tests cover:
//! - Config building from INI files on disk (build_engine_config, build_holdings)
//! - Validation failures surfacing as config errors with exit code 2
//! - Evaluate pipeline with MockDataPort writing the console report
//! - `validate` and `evaluate` subcommands end to end over CSV data

mod common;

use clap::Parser;
use common::*;
use dualsignal::cli::{self, Cli};
use dualsignal::domain::config_validation::validate_engine_config;
use dualsignal::domain::decision::HoldingState;
use dualsignal::domain::error::SignalError;
use dualsignal::domain::strategy::{Action, StrategyRule};
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ExitCode has no PartialEq; compare the Debug form instead.
fn same_exit(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{:?}", actual) == format!("{:?}", expected)
}

const VALID_INI: &str = r#"
[engine]
instruments = A, B, C
lookback_days = 365
provider = csv
csv_dir = data

[parking]
code = KOFR
symbol = KOFR
trend_window = 60

[holdings]
B = true

[instrument.A]
name = Alpha Leverage
symbol = A.KS
strategy = disparity_band

[instrument.B]
name = Beta Leverage
strategy = disparity_band
ma_window = 60
entry_bull = 104
exit_bull = 100

[instrument.C]
name = Gamma 150
strategy = trend_zscore
regression_window = 20
trend_window = 60
entry_depth = -1.7
exit_level = 0.3
"#;

mod config_building {
    use super::*;

    #[test]
    fn valid_ini_builds_engine_config() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        validate_engine_config(&adapter).unwrap();

        let config = cli::build_engine_config(&adapter).unwrap();
        assert_eq!(config.instruments.len(), 3);
        assert_eq!(config.instruments[0].name, "Alpha Leverage");
        assert_eq!(config.instruments[0].symbol, "A.KS");
        assert_eq!(config.instruments[1].symbol, "B");
        assert!(matches!(config.instruments[2].rule, StrategyRule::TrendZScore(_)));
        assert_eq!(config.lookback_days, 365);

        let parking = config.parking.unwrap();
        assert_eq!(parking.code, "KOFR");
        assert_eq!(parking.trend_window, 60);
    }

    #[test]
    fn shipped_sample_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/dualsignal.ini");
        let adapter = cli::load_config(&path).unwrap();
        validate_engine_config(&adapter).unwrap();

        let config = cli::build_engine_config(&adapter).unwrap();
        let codes: Vec<&str> = config.instruments.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["KODEX_LEV", "KOSDAQ_LEV"]);
        match &config.instruments[1].rule {
            StrategyRule::DisparityBand(band) => {
                assert!(band.bull.is_none());
                assert_eq!(band.entry_bear, 90.0);
            }
            other => panic!("expected disparity band, got {:?}", other),
        }
    }

    #[test]
    fn holdings_come_from_config_and_flags() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();

        let holdings = cli::build_holdings(&adapter, &[]).unwrap();
        assert!(holdings.is_holding("B"));
        assert!(!holdings.is_holding("A"));

        let holdings = cli::build_holdings(&adapter, &["a".to_string()]).unwrap();
        assert!(holdings.is_holding("A"));
        assert!(holdings.is_holding("B"));
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = cli::load_config(std::path::Path::new("/nonexistent/dualsignal.ini")).unwrap_err();
        assert!(matches!(err, SignalError::ConfigParse { .. }));
        assert!(same_exit(ExitCode::from(&err), ExitCode::from(2)));
    }

    #[test]
    fn invalid_threshold_is_config_error() {
        let ini = VALID_INI.replace("exit_level = 0.3", "exit_level = -2.0");
        let file = write_temp_ini(&ini);
        let adapter = cli::load_config(file.path()).unwrap();

        let err = validate_engine_config(&adapter).unwrap_err();
        assert!(matches!(err, SignalError::ConfigInvalid { ref key, .. } if key == "entry_depth"));
        assert!(same_exit(ExitCode::from(&err), ExitCode::from(2)));
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn report_is_written_and_returned() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::build_engine_config(&adapter).unwrap();
        let holdings = cli::build_holdings(&adapter, &[]).unwrap();

        let mut closes_c = rising(80, 100.0, 1.0);
        closes_c.push(160.0);
        let port = MockDataPort::new()
            .with_closes("A", &with_final_disparity(flat(80, 100.0), 60, 94.0))
            .with_closes("B", &with_final_disparity(rising(80, 100.0, 1.0), 60, 99.0))
            .with_closes("C", &closes_c)
            .with_closes("KOFR", &rising(81, 100.0, 0.01));

        let mut out: Vec<u8> = Vec::new();
        let report =
            cli::run_evaluate_pipeline(&port, &config, &holdings, last_date(81), &mut out).unwrap();

        let actions: Vec<Action> = report.decisions.iter().map(|d| d.action).collect();
        assert_eq!(
            actions,
            vec![Action::EnterLong, Action::ExitTrendBroken, Action::EnterLong]
        );

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("== Alpha Leverage (A) =="));
        assert!(text.contains("== Gamma 150 (C) =="));
        assert!(text.contains("Sell:  B"));
        assert!(text.contains("Buy:   A 50.0%, C 50.0%"));
        assert!(text.contains("park idle cash in KOFR"));
    }

    #[test]
    fn unavailable_instruments_are_listed() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::build_engine_config(&adapter).unwrap();

        let port = MockDataPort::new()
            .with_closes("A", &rising(20, 100.0, 1.0))
            .with_error("B", "HTTP 503")
            .with_closes("C", &rising(80, 100.0, 1.0));

        let mut out: Vec<u8> = Vec::new();
        let report =
            cli::run_evaluate_pipeline(&port, &config, &HoldingState::new(), last_date(80), &mut out)
                .unwrap();

        assert_eq!(report.decisions.len(), 1);
        assert_eq!(report.unavailable.len(), 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("== Data Unavailable =="));
        assert!(text.contains("Alpha Leverage (A): insufficient data"));
        assert!(text.contains("Beta Leverage (B): data retrieval failed"));
        assert!(text.contains("Cash:  hold cash"));
    }
}

mod commands {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(dir: &std::path::Path, code: &str, closes: &[f64]) {
        let mut content = String::from("date,close\n");
        for p in points(start_date(), closes) {
            let _ = writeln!(content, "{},{}", p.date, p.close);
        }
        fs::write(dir.join(format!("{}.csv", code)), content).unwrap();
    }

    fn csv_ini(data: &TempDir, extra: &str) -> String {
        format!(
            "[engine]\n\
             instruments = A\n\
             provider = csv\n\
             csv_dir = {}\n\
             {}\n\
             [instrument.A]\n\
             strategy = disparity_band\n",
            data.path().display(),
            extra
        )
    }

    fn run(args: &[&str]) -> ExitCode {
        cli::run(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn validate_succeeds_on_valid_config() {
        let data = TempDir::new().unwrap();
        let file = write_temp_ini(&csv_ini(&data, ""));
        let path = file.path().to_str().unwrap();

        assert!(same_exit(
            run(&["dualsignal", "validate", "--config", path]),
            ExitCode::SUCCESS
        ));
    }

    #[test]
    fn validate_rejects_bad_config() {
        let data = TempDir::new().unwrap();
        let file = write_temp_ini(&csv_ini(&data, "lookback_days = 0"));
        let path = file.path().to_str().unwrap();

        assert!(same_exit(
            run(&["dualsignal", "validate", "--config", path]),
            ExitCode::from(2)
        ));
    }

    #[test]
    fn evaluate_runs_over_csv() {
        let data = TempDir::new().unwrap();
        write_csv(data.path(), "A", &rising(81, 100.0, 1.0));
        let file = write_temp_ini(&csv_ini(&data, ""));
        let path = file.path().to_str().unwrap();
        let as_of = last_date(81).to_string();

        let code = run(&[
            "dualsignal",
            "evaluate",
            "--config",
            path,
            "--as-of",
            &as_of,
            "--hold",
            "A",
            "--no-cache",
        ]);
        assert!(same_exit(code, ExitCode::SUCCESS));
    }

    #[test]
    fn evaluate_rejects_unknown_hold_code() {
        let data = TempDir::new().unwrap();
        let file = write_temp_ini(&csv_ini(&data, ""));
        let path = file.path().to_str().unwrap();

        assert!(same_exit(
            run(&["dualsignal", "evaluate", "--config", path, "--hold", "B", "--no-cache"]),
            ExitCode::from(2)
        ));
    }

    #[test]
    fn evaluate_rejects_misspelled_holding() {
        let data = TempDir::new().unwrap();
        let ini = format!("{}[holdings]\nA = treu\n", csv_ini(&data, ""));
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();

        assert!(same_exit(
            run(&["dualsignal", "evaluate", "--config", path, "--no-cache"]),
            ExitCode::from(2)
        ));
    }

    #[test]
    fn fractional_window_is_rejected_not_defaulted() {
        let data = TempDir::new().unwrap();
        let ini = format!("{}ma_window = 20.5\n", csv_ini(&data, ""));
        let file = write_temp_ini(&ini);
        let path = file.path().to_str().unwrap();

        assert!(same_exit(
            run(&["dualsignal", "validate", "--config", path]),
            ExitCode::from(2)
        ));
    }

    #[test]
    fn evaluate_with_missing_data_still_succeeds() {
        let data = TempDir::new().unwrap();
        let file = write_temp_ini(&csv_ini(&data, ""));
        let path = file.path().to_str().unwrap();

        assert!(same_exit(
            run(&["dualsignal", "evaluate", "--config", path, "--as-of", "2024-03-21"]),
            ExitCode::SUCCESS
        ));
    }

    #[test]
    fn bad_as_of_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["dualsignal", "evaluate", "--config", "x.ini", "--as-of", "21/03/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["dualsignal", "validate", "--config", "x.ini", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
