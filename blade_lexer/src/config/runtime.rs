// RUNTIME PREFERENCES (User Experience)
//
// Defaults come from BLADE_* environment variables; a full RuntimeConfig can
// also be loaded from a TOML file.

use crate::logging::codes;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Directive names that switch the lexer into raw mode by default
pub const DEFAULT_RAW_FUNCTIONS: &[&str] = &["js", "verbatim"];

/// Raw directive whose body is emitted as ordinary text
pub const DEFAULT_TRANSPARENT_RAW_FUNCTION: &str = "verbatim";

/// Errors raised while loading runtime configuration
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    Parse { message: String },

    #[error("Invalid raw directive name '{name}': only ASCII letters are allowed")]
    InvalidRawFunction { name: String },
}

impl ConfigError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            ConfigError::Io { .. } => codes::config::CONFIG_READ_FAILURE,
            ConfigError::Parse { .. } => codes::config::INVALID_CONFIGURATION,
            ConfigError::InvalidRawFunction { .. } => codes::config::INVALID_RAW_FUNCTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to require a .blade / .blade.html extension
    pub require_blade_extension: bool,

    /// Whether to log timing for each processed file
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_blade_extension: env::var(env_vars::REQUIRE_BLADE_EXTENSION)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_performance_logging: env::var(env_vars::ENABLE_PERFORMANCE_LOGGING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Directive names whose bodies are copied verbatim up to `@end<name>`
    pub raw_functions: Vec<String>,

    /// Raw directive emitted as plain text instead of a raw-function token
    pub transparent_raw_function: String,

    /// Raise an error for comments, data, argument lists and raw blocks
    /// left open at end of input instead of accepting them
    pub strict_termination: bool,

    /// Whether to collect token metrics while lexing
    pub collect_detailed_metrics: bool,
}

impl LexicalPreferences {
    /// Replace the raw directive set
    pub fn with_raw_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw_functions = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_termination = strict;
        self
    }

    pub fn is_raw_function(&self, name: &str) -> bool {
        self.raw_functions.iter().any(|raw| raw == name)
    }

    pub fn is_transparent(&self, name: &str) -> bool {
        self.transparent_raw_function == name
    }

    /// Directive names must be plain ASCII words to ever match `@name`
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in &self.raw_functions {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidRawFunction { name: name.clone() });
            }
        }
        Ok(())
    }
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            raw_functions: env::var(env_vars::LEXICAL_RAW_FUNCTIONS)
                .ok()
                .map(|v| parse_name_list(&v))
                .unwrap_or_else(|| {
                    DEFAULT_RAW_FUNCTIONS
                        .iter()
                        .map(|name| name.to_string())
                        .collect()
                }),
            transparent_raw_function: env::var(env_vars::LEXICAL_TRANSPARENT_RAW)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TRANSPARENT_RAW_FUNCTION.to_string()),
            strict_termination: env::var(env_vars::LEXICAL_STRICT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            collect_detailed_metrics: env::var(env_vars::LEXICAL_DETAILED_METRICS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level that reaches the console
    pub min_log_level: LogLevel,

    /// Whether to attach the current file path to events
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_file_context: env::var(env_vars::LOGGING_INCLUDE_FILE_CONTEXT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

/// Event severity; a level admits itself and everything before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Parse log level from string (used for environment variables)
fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Comma-separated names with blanks dropped
pub fn parse_name_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub lexical: LexicalPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML document; missing sections keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.lexical.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const REQUIRE_BLADE_EXTENSION: &str = "BLADE_REQUIRE_BLADE_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "BLADE_ENABLE_PERFORMANCE_LOGGING";

    // Lexical
    pub const LEXICAL_RAW_FUNCTIONS: &str = "BLADE_LEXICAL_RAW_FUNCTIONS";
    pub const LEXICAL_TRANSPARENT_RAW: &str = "BLADE_LEXICAL_TRANSPARENT_RAW";
    pub const LEXICAL_STRICT: &str = "BLADE_LEXICAL_STRICT";
    pub const LEXICAL_DETAILED_METRICS: &str = "BLADE_LEXICAL_DETAILED_METRICS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "BLADE_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "BLADE_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "BLADE_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "BLADE_LOGGING_INCLUDE_FILE_CONTEXT";
}
