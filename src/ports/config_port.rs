//! Configuration access port trait.

/// Boolean spellings accepted in hand-edited config files. `None` for
/// anything else.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Sectioned key/value access. Implementations treat section and key names
/// case-insensitively.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// True when the key is present with a non-blank value.
    fn has(&self, section: &str, key: &str) -> bool {
        self.get_string(section, key)
            .is_some_and(|v| !v.trim().is_empty())
    }

    /// Keys present in a section, sorted. Used for open-ended sections such
    /// as `[holdings]`.
    fn keys(&self, section: &str) -> Vec<String>;
}
