//! `log_*!` macros
//!
//! Every macro takes an optional trailing list of `"key" => value` pairs.
//! Values only need `Display`; nothing is stringified until a service is
//! installed.

/// Builds the context list for [`crate::logging::emit`]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_context {
    ($($key:expr => $value:expr),*) => {
        vec![$(($key, ::std::string::ToString::to_string(&$value))),*]
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_emit {
    ($event:expr $(, $key:expr => $value:expr)*) => {
        if $crate::logging::is_initialized() {
            $crate::logging::emit($event, $crate::__log_context!($($key => $value),*))
        }
    };
}

/// `log_error!(code, message [, span = span] [, "key" => value]*)`
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_emit!(
            $crate::logging::LogEvent::error($code, $message).at($span)
            $(, $key => $value)*
        )
    };
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_emit!($crate::logging::LogEvent::error($code, $message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_emit!($crate::logging::LogEvent::success($code, $message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_emit!($crate::logging::LogEvent::info($message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_emit!($crate::logging::LogEvent::warning($message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_emit!($crate::logging::LogEvent::debug($message) $(, $key => $value)*)
    };
}

/// Success event with the elapsed time as `duration_ms`
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log_success!($code, $message,
            "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
            $(, $key => $value)*
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;
    use crate::utils::{Position, Span};

    #[test]
    fn test_context_pairs_are_stringified() {
        let path = std::path::PathBuf::from("views/home.blade.html");
        let context: Vec<(&str, String)> = crate::__log_context!(
            "char" => '}',
            "depth" => 2usize,
            "file" => path.display()
        );

        assert_eq!(
            context,
            vec![
                ("char", "}".to_string()),
                ("depth", "2".to_string()),
                ("file", "views/home.blade.html".to_string()),
            ]
        );
    }

    #[test]
    fn test_every_macro_form_expands() {
        let duration = std::time::Duration::from_millis(12);

        log_error!(codes::lexical::BRACKET_MISMATCH, "expected ')', got '}'",
            span = Span::point(Position::start()),
            "char" => '}'
        );
        log_error!(codes::file_processing::EMPTY_FILE, "File is empty");
        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
            "tokens" => 12,
        );
        log_info!("Reading template");
        log_warning!("Template is large", "bytes" => 2_000_000u64);
        log_debug!("Raw block entered", "name" => "verbatim");
        log_performance!(codes::success::FILE_PROCESSING_SUCCESS, "File processed",
            duration = duration,
            "lines" => 3
        );
    }
}
