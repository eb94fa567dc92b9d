//! Global logging for the Blade lexer
//!
//! One process-wide `LoggingService` behind a `OnceLock`, a per-thread file
//! context attached to every event, and [`emit`], the sink of the `log_*!`
//! macros. Nothing is logged until a service is installed.

pub mod codes;
pub mod events;
pub mod macros;
pub mod service;

use crate::config::LoggingPreferences;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::OnceLock;

pub use codes::Code;
pub use events::LogEvent;
pub use service::{Logger, LoggingService, MemoryLogger, StderrLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

struct GlobalLogger {
    service: LoggingService,
    include_file_context: bool,
}

static GLOBAL_LOGGER: OnceLock<GlobalLogger> = OnceLock::new();

thread_local! {
    static FILE_CONTEXT: RefCell<Option<FileContext>> = const { RefCell::new(None) };
}

/// File currently being processed on this thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    pub file_path: PathBuf,
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Install the stderr service described by `preferences`
///
/// With console logging disabled nothing is installed and the macros stay
/// silent.
pub fn init_global_logging(preferences: &LoggingPreferences) -> Result<(), String> {
    let Some(service) = LoggingService::from_preferences(preferences) else {
        return Ok(());
    };
    init_global_logging_with_service(service, preferences.include_file_context)?;

    crate::log_success!(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Logging initialized",
        "min_level" => preferences.min_log_level.as_str()
    );
    Ok(())
}

/// Install a specific service; only the first installation takes effect
pub fn init_global_logging_with_service(
    service: LoggingService,
    include_file_context: bool,
) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(GlobalLogger {
            service,
            include_file_context,
        })
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

// ============================================================================
// FILE CONTEXT MANAGEMENT
// ============================================================================

pub fn set_file_context(file_path: PathBuf) {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(FileContext { file_path });
    });
}

pub fn clear_file_context() {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Execute function with file context
pub fn with_file_context<F, R>(file_path: PathBuf, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_file_context(file_path);
    let result = f();
    clear_file_context();
    result
}

pub fn get_current_file_context() -> Option<FileContext> {
    FILE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT
// ============================================================================

/// Attach context pairs and the current file, then hand the event to the
/// global service
pub fn emit(mut event: LogEvent, context: Vec<(&str, String)>) {
    let Some(global) = GLOBAL_LOGGER.get() else {
        return;
    };
    if !global.service.enabled(event.level) {
        return;
    }

    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if global.include_file_context {
        if let Some(file_ctx) = get_current_file_context() {
            event = event.with_context("file", file_ctx.file_path.display().to_string());
        }
    }

    global.service.log(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::sync::Arc;

    #[test]
    fn test_file_context_management() {
        let file_path = PathBuf::from("views/home.blade.html");

        clear_file_context();
        assert!(get_current_file_context().is_none());

        set_file_context(file_path.clone());
        assert_eq!(get_current_file_context().unwrap().file_path, file_path);

        clear_file_context();
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_with_file_context() {
        let file_path = PathBuf::from("views/layout.blade.html");

        let result = with_file_context(file_path.clone(), || {
            assert_eq!(get_current_file_context().unwrap().file_path, file_path);
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_disabled_console_installs_nothing() {
        let preferences = LoggingPreferences {
            use_structured_logging: false,
            enable_console_logging: false,
            min_log_level: LogLevel::Debug,
            include_file_context: true,
        };
        let installed_before = is_initialized();
        assert!(init_global_logging(&preferences).is_ok());
        assert_eq!(is_initialized(), installed_before);
    }

    #[test]
    fn test_global_logger_receives_lexer_errors() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Debug);
        // The global logger can only be installed once per process
        if init_global_logging_with_service(service, true).is_err() {
            return;
        }
        assert!(is_initialized());

        let path = PathBuf::from("views/broken.blade.html");
        let result = with_file_context(path, || crate::lexical::tokenize_str("@if($a]"));
        assert!(result.is_err());

        assert!(memory.has_error(codes::lexical::BRACKET_MISMATCH));
        let event = memory
            .events()
            .into_iter()
            .find(|event| event.has_code(codes::lexical::BRACKET_MISMATCH))
            .unwrap();
        assert!(event.span.is_some());
        assert_eq!(
            event.context.get("file").map(String::as_str),
            Some("views/broken.blade.html")
        );
    }
}
