//! Log events: a level, an optional code, a message and key/value context
//!
//! Errors and successes carry a registered [`Code`]; plain info, warning and
//! debug notes do not.

use super::codes::{Code, ErrorMetadata};
use crate::config::compile_time::logging::MAX_LOG_MESSAGE_LENGTH;
use crate::config::LogLevel;
use crate::utils::Span;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub code: Option<Code>,
    pub message: String,
    pub span: Option<Span>,
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, code: Option<Code>, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: clamp(message),
            span: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, Some(code), message)
    }

    /// An info event marking a completed operation
    pub fn success(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, Some(code), message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, None, message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, None, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, None, message)
    }

    /// Attach the template span the event refers to
    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn has_code(&self, code: Code) -> bool {
        self.code == Some(code)
    }

    pub fn metadata(&self) -> Option<&'static ErrorMetadata> {
        self.code.and_then(|code| code.metadata())
    }

    /// One JSON object per event, for `use_structured_logging`
    pub fn to_json(&self) -> Value {
        let mut event = json!({
            "timestamp": self.timestamp.to_rfc3339(),
            "level": self.level.as_str(),
            "message": self.message,
        });

        if let Some(code) = self.code {
            event["code"] = json!(code.as_str());
        }
        if let Some(metadata) = self.metadata() {
            event["category"] = json!(metadata.category);
            event["severity"] = json!(metadata.severity.as_str());
            if self.is_error() {
                event["recoverable"] = json!(metadata.recoverable);
            }
        }
        if let Some(span) = self.span {
            event["span"] = json!({
                "start": span.start().offset,
                "end": span.end().offset,
                "line": span.start().line,
                "column": span.start().column,
            });
        }
        if !self.context.is_empty() {
            event["context"] = json!(self.context);
        }

        event
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.level.as_str())?;
        if let Some(code) = self.code {
            write!(f, " {}", code)?;
        }
        write!(f, " {}", self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span.start())?;
        }
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            write!(f, " ({})", pairs.join(", "))?;
        }
        Ok(())
    }
}

/// Messages longer than the compile-time limit are cut at a char boundary
fn clamp(message: &str) -> String {
    match message.char_indices().nth(MAX_LOG_MESSAGE_LENGTH) {
        Some((end, _)) => format!("{}...", &message[..end]),
        None => message.to_string(),
    }
}
