//! String-keyed compressor parameters with late numeric coercion.
//!
//! Backends read their parameters out of a [`CompressorConfig`] at call time.
//! Three outcomes stay distinguishable: an absent key, an empty value (both
//! fall back to the backend's default), and a value that fails to coerce
//! (an error, never a silent default).

use rustc_hash::FxHashMap;
use std::str::FromStr;

use crate::error::ConfigError;

/// Outcome of looking up and coercing one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// The key is not present.
    Absent,
    /// The key is present with an empty value.
    Empty,
    /// The value does not coerce to the requested type.
    Invalid(String),
    /// The coerced value.
    Value(T),
}

/// Mapping from parameter name to string value; keys are unique.
#[derive(Debug, Clone, Default)]
pub struct CompressorConfig {
    params: FxHashMap<String, String>,
}

impl CompressorConfig {
    pub fn new() -> CompressorConfig {
        CompressorConfig::default()
    }

    pub fn from_map(params: FxHashMap<String, String>) -> CompressorConfig {
        CompressorConfig { params }
    }

    /// Sets a parameter, replacing any previous value for the key.
    pub fn set(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Looks up `key` and coerces its value to `T`.
    pub fn lookup<T: FromStr>(&self, key: &str) -> Lookup<T> {
        match self.params.get(key) {
            None => Lookup::Absent,
            Some(value) if value.is_empty() => Lookup::Empty,
            Some(value) => match value.parse() {
                Ok(parsed) => Lookup::Value(parsed),
                Err(_) => Lookup::Invalid(value.clone()),
            },
        }
    }

    /// Coerced value of `key`, or `default` when the key is absent or empty.
    /// A present but non-coercible value is an error.
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.lookup(key) {
            Lookup::Absent | Lookup::Empty => Ok(default),
            Lookup::Value(value) => Ok(value),
            Lookup::Invalid(value) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_falls_back_to_default() {
        let config = CompressorConfig::new();
        assert_eq!(config.lookup::<f64>("abs"), Lookup::Absent);
        assert_eq!(config.get_or("abs", 1e-3), Ok(1e-3));
    }

    #[test]
    fn empty_value_falls_back_to_default() {
        let mut config = CompressorConfig::new();
        config.set("abs", "");
        assert_eq!(config.lookup::<f64>("abs"), Lookup::Empty);
        assert_eq!(config.get_or("abs", 1e-3), Ok(1e-3));
    }

    #[test]
    fn present_value_is_coerced() {
        let mut config = CompressorConfig::new();
        config.set("abs", "0.05");
        assert_eq!(config.lookup::<f64>("abs"), Lookup::Value(0.05));
        assert_eq!(config.get_or("abs", 1e-3), Ok(0.05));
    }

    #[test]
    fn invalid_value_is_an_error_not_a_default() {
        let mut config = CompressorConfig::new();
        config.set("abs", "not-a-number");
        assert_eq!(
            config.lookup::<f64>("abs"),
            Lookup::Invalid("not-a-number".to_string())
        );
        assert_eq!(
            config.get_or("abs", 1e-3),
            Err(ConfigError::InvalidValue {
                key: "abs".to_string(),
                value: "not-a-number".to_string(),
            })
        );
    }

    #[test]
    fn keys_are_unique_and_last_write_wins() {
        let mut config = CompressorConfig::new();
        config.set("level", "3");
        config.set("level", "19");
        assert_eq!(config.get_or("level", 0i32), Ok(19));
    }
}
