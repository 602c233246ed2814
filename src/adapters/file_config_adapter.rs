//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive (configparser lowercases them).

use crate::domain::error::SignalError;
use crate::ports::config_port::{ConfigPort, parse_bool};
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SignalError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SignalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SignalError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| parse_bool(v))
            .unwrap_or(default)
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const SAMPLE: &str = r#"
[engine]
instruments = KODEX_LEV, KOSDAQ_LEV
lookback_days = 365
provider = csv

[holdings]
KODEX_LEV = true
kosdaq_lev = no

[instrument.KODEX_LEV]
name = KODEX Leverage
symbol = 122630.KS
strategy = disparity_band
entry_bull = 104
exit_bear_loss = 85.5
"#;

    #[test]
    fn from_string_parses_config() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("engine", "instruments"),
            Some("KODEX_LEV, KOSDAQ_LEV".to_string())
        );
        assert_eq!(
            adapter.get_string("instrument.KODEX_LEV", "symbol"),
            Some("122630.KS".to_string())
        );
    }

    #[test]
    fn section_and_key_lookup_is_case_insensitive() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("INSTRUMENT.kodex_lev", "NAME"),
            Some("KODEX Leverage".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("engine", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("engine", "lookback_days", 0), 365);
        assert_eq!(adapter.get_int("engine", "missing", 42), 42);
        assert_eq!(adapter.get_int("engine", "provider", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_double("instrument.kodex_lev", "exit_bear_loss", 0.0),
            85.5
        );
        assert_eq!(
            adapter.get_double("instrument.kodex_lev", "entry_bull", 0.0),
            104.0
        );
        assert_eq!(adapter.get_double("engine", "missing", 99.9), 99.9);
        assert_eq!(adapter.get_double("engine", "provider", 99.9), 99.9);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert!(adapter.get_bool("holdings", "KODEX_LEV", false));
        assert!(!adapter.get_bool("holdings", "KOSDAQ_LEV", true));
        assert!(adapter.get_bool("holdings", "missing", true));
    }

    #[test]
    fn has_ignores_blank_values() {
        let adapter = FileConfigAdapter::from_string("[parking]\ncode =\nsymbol = X\n").unwrap();
        assert!(!adapter.has("parking", "code"));
        assert!(adapter.has("parking", "symbol"));
        assert!(!adapter.has("parking", "missing"));
    }

    #[test]
    fn keys_lists_section_entries() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.keys("holdings"), vec!["kodex_lev", "kosdaq_lev"]);
        assert!(adapter.keys("nothing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("engine", "provider"), Some("csv".to_string()));
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(
            result,
            Err(SignalError::ConfigParse { ref file, .. }) if file == "/nonexistent/path/config.ini"
        ));
    }

    #[test]
    fn bool_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[holdings]
a = on
b = Y
c = off
d = maybe
").unwrap();
        assert!(adapter.get_bool("holdings", "a", false));
        assert!(adapter.get_bool("holdings", "b", false));
        assert!(!adapter.get_bool("holdings", "c", true));
        assert!(adapter.get_bool("holdings", "d", true));
        assert!(!adapter.get_bool("holdings", "d", false));
    }
}
