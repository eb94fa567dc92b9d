//! Where log events go

use super::codes::Code;
use super::events::LogEvent;
use crate::config::compile_time::logging::LOG_BUFFER_SIZE;
use crate::config::{LogLevel, LoggingPreferences};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// A destination for events that already passed the level filter
pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Level filter in front of a single logger
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Stderr service for the CLI; `None` when console output is disabled
    pub fn from_preferences(preferences: &LoggingPreferences) -> Option<Self> {
        if !preferences.enable_console_logging {
            return None;
        }
        let logger = StderrLogger {
            json: preferences.use_structured_logging,
        };
        Some(Self::new(Arc::new(logger), preferences.min_log_level))
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log(&self, event: LogEvent) {
        if self.enabled(event.level) {
            self.logger.log(&event);
        }
    }
}

/// Writes one line per event to stderr; stdout is reserved for tokens
pub struct StderrLogger {
    pub json: bool,
}

impl Logger for StderrLogger {
    fn log(&self, event: &LogEvent) {
        if self.json {
            eprintln!("{}", event.to_json());
        } else {
            eprintln!("{}", event);
        }
    }
}

/// Keeps the most recent events in memory; oldest are evicted first
pub struct MemoryLogger {
    events: Mutex<VecDeque<LogEvent>>,
    capacity: usize,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::with_capacity(LOG_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn has_error(&self, code: Code) -> bool {
        self.lock()
            .iter()
            .any(|event| event.is_error() && event.has_code(code))
    }

    pub fn has_success(&self, code: Code) -> bool {
        self.lock()
            .iter()
            .any(|event| !event.is_error() && event.has_code(code))
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}
