//! Configuration lookup port.
//!
//! Values are addressed by INI-style `[section] key`. Typed getters return
//! `default` when the key is absent or does not parse.

pub trait ConfigPort {
    /// `None` for absent or blank values.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .unwrap_or_else(|| default.to_string())
    }
}
