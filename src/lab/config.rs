//! Configuration for the lab scheduler.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods (`max_steps(500)`)
//! 2. **Environment variables**: values from `OXIDE_*` env vars
//! 3. **Config file**: values loaded from a TOML file (requires `config-file` feature)
//! 4. **Defaults**: built-in defaults from [`SchedulerConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `OXIDE_SCHEDULER_MAX_STEPS` | `usize` | `max_steps` |
//! | `OXIDE_SCHEDULER_START_MS` | `u64` (milliseconds) | `start` |
//! | `OXIDE_SCHEDULER_TRACE_TIMERS` | `bool` | `trace_timers` |
//!
//! Environment overrides are opt-in: [`SchedulerConfig::default()`] and
//! `Scheduler::new()` never read the environment. Use
//! [`SchedulerConfig::from_env`], `Scheduler::from_env` or, with the
//! `config-file` feature, `SchedulerConfig::load`.

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable name for the step limit.
pub const ENV_MAX_STEPS: &str = "OXIDE_SCHEDULER_MAX_STEPS";
/// Environment variable name for the initial virtual time, in milliseconds.
pub const ENV_START_MS: &str = "OXIDE_SCHEDULER_START_MS";
/// Environment variable name for per-timer logging.
pub const ENV_TRACE_TIMERS: &str = "OXIDE_SCHEDULER_TRACE_TIMERS";

/// Default limit on timer fires / polls per driving call.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Configuration for the lab scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of steps `run_until_idle` and `block_on` may take.
    pub max_steps: usize,
    /// Virtual time the scheduler starts at.
    pub start: Duration,
    /// Log every timer fire at `debug` instead of `trace`.
    pub trace_timers: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            start: Duration::ZERO,
            trace_timers: false,
        }
    }

    /// Sets the step limit.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the initial virtual time.
    #[must_use]
    pub const fn start(mut self, start: Duration) -> Self {
        self.start = start;
        self
    }

    /// Sets whether timer fires are logged at `debug`.
    #[must_use]
    pub const fn trace_timers(mut self, value: bool) -> Self {
        self.trace_timers = value;
        self
    }

    /// Defaults overridden by any `OXIDE_SCHEDULER_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

/// Apply environment variable overrides to a [`SchedulerConfig`].
///
/// Only variables that are set in the environment are applied.
/// Returns an error if a variable is set but contains an unparseable value.
pub fn apply_env_overrides(config: &mut SchedulerConfig) -> Result<(), ConfigError> {
    if let Some(val) = env_var(ENV_MAX_STEPS) {
        config.max_steps = parse_usize(ENV_MAX_STEPS, &val)?;
    }
    if let Some(val) = env_var(ENV_START_MS) {
        config.start = Duration::from_millis(parse_u64(ENV_START_MS, &val)?);
    }
    if let Some(val) = env_var(ENV_TRACE_TIMERS) {
        config.trace_timers = parse_bool(ENV_TRACE_TIMERS, &val)?;
    }
    Ok(())
}

/// Reads an environment variable, returning `None` if unset or not unicode.
#[must_use]
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
        var,
        expected: "unsigned integer",
        value: val.to_owned(),
    })
}

fn parse_u64(var: &'static str, val: &str) -> Result<u64, ConfigError> {
    val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        var,
        expected: "u64",
        value: val.to_owned(),
    })
}

fn parse_bool(var: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            expected: "bool (true/false/1/0/yes/no)",
            value: val.to_owned(),
        }),
    }
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable scheduler configuration.
///
/// ```toml
/// [scheduler]
/// max_steps = 500
/// start_ms = 1000
/// trace_timers = true
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct SchedulerTomlConfig {
    /// Scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerToml,
}

/// Scheduler section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct SchedulerToml {
    /// Step limit.
    pub max_steps: Option<usize>,
    /// Initial virtual time in milliseconds.
    pub start_ms: Option<u64>,
    /// Log every timer fire at `debug`.
    pub trace_timers: Option<bool>,
}

/// Apply a parsed TOML config to a [`SchedulerConfig`].
///
/// Only fields that are `Some` in the TOML struct override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut SchedulerConfig, toml: &SchedulerTomlConfig) {
    if let Some(v) = toml.scheduler.max_steps {
        config.max_steps = v;
    }
    if let Some(v) = toml.scheduler.start_ms {
        config.start = Duration::from_millis(v);
    }
    if let Some(v) = toml.scheduler.trace_timers {
        config.trace_timers = v;
    }
}

/// Parse a TOML string into a [`SchedulerTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<SchedulerTomlConfig, ConfigError> {
    Ok(toml::from_str(toml_str)?)
}

/// Read and parse a TOML file into a [`SchedulerTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<SchedulerTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_toml_str(&content)
}

#[cfg(feature = "config-file")]
impl SchedulerConfig {
    /// Loads a configuration with full precedence: the TOML file at `path`
    /// over defaults, then `OXIDE_SCHEDULER_*` variables over the file.
    ///
    /// Programmatic setters applied to the result take precedence over both.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        apply_toml_config(&mut config, &parse_toml_file(path)?);
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::env_lock;

    fn clear_env() {
        for var in [ENV_MAX_STEPS, ENV_START_MS, ENV_TRACE_TIMERS] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(config.start, Duration::ZERO);
        assert!(!config.trace_timers);
    }

    #[test]
    fn builder_setters() {
        let config = SchedulerConfig::new()
            .max_steps(3)
            .start(Duration::from_secs(1))
            .trace_timers(true);
        assert_eq!(config.max_steps, 3);
        assert_eq!(config.start, Duration::from_secs(1));
        assert!(config.trace_timers);
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var(ENV_MAX_STEPS, " 42 ");
        std::env::set_var(ENV_START_MS, "1500");
        std::env::set_var(ENV_TRACE_TIMERS, "yes");

        let config = SchedulerConfig::from_env().expect("valid env");
        clear_env();

        assert_eq!(config.max_steps, 42);
        assert_eq!(config.start, Duration::from_millis(1500));
        assert!(config.trace_timers);
    }

    #[test]
    fn unset_env_keeps_defaults() {
        let _guard = env_lock();
        clear_env();
        assert_eq!(
            SchedulerConfig::from_env().expect("valid env"),
            SchedulerConfig::default()
        );
        assert_eq!(env_var(ENV_MAX_STEPS), None);
    }

    #[test]
    fn invalid_env_value_is_an_error() {
        let _guard = env_lock();
        clear_env();
        std::env::set_var(ENV_TRACE_TIMERS, "maybe");
        let err = SchedulerConfig::from_env().unwrap_err();
        clear_env();
        assert_eq!(
            err.to_string(),
            "invalid value for OXIDE_SCHEDULER_TRACE_TIMERS: expected bool (true/false/1/0/yes/no), got \"maybe\""
        );
    }

    #[test]
    fn bool_spellings() {
        for on in ["true", "1", "YES", "On"] {
            assert!(parse_bool(ENV_TRACE_TIMERS, on).expect("parses"));
        }
        for off in ["false", "0", "no", "OFF"] {
            assert!(!parse_bool(ENV_TRACE_TIMERS, off).expect("parses"));
        }
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_fields_override_defaults() {
        let parsed = parse_toml_str(
            r"
            [scheduler]
            max_steps = 7
            start_ms = 250
            ",
        )
        .expect("valid toml");
        let mut config = SchedulerConfig::new();
        apply_toml_config(&mut config, &parsed);
        assert_eq!(config.max_steps, 7);
        assert_eq!(config.start, Duration::from_millis(250));
        assert!(!config.trace_timers);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_parse_error_is_reported() {
        let err = parse_toml_str("[scheduler]\nmax_steps = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
