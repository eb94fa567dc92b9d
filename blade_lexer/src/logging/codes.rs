//! Error and success codes with their classification metadata
//!
//! Every code the lexer, file loader and configuration layer can emit is
//! declared once in the `registry!` table below, which produces both the
//! constant and its registry entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Short stable identifier such as `E020`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// `None` for codes that were never registered
    pub fn metadata(&self) -> Option<&'static ErrorMetadata> {
        get_error_metadata(self.0)
    }

    pub fn category(&self) -> &'static str {
        self.metadata().map_or("Unknown", |m| m.category)
    }

    /// Unregistered codes count as recoverable
    pub fn is_recoverable(&self) -> bool {
        self.metadata().map_or(true, |m| m.recoverable)
    }

    pub fn requires_halt(&self) -> bool {
        self.metadata().is_some_and(|m| m.requires_halt)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

/// `module { NAME = "code", Category, Severity, recoverable, halt, "description", "action"; }`
macro_rules! registry {
    ($(
        $(#[$module_doc:meta])*
        $module:ident {
            $($name:ident = $code:literal, $category:literal, $severity:ident,
              $recoverable:literal, $halt:literal, $description:literal, $action:literal;)+
        }
    )+) => {
        $(
            $(#[$module_doc])*
            pub mod $module {
                use super::Code;
                $(pub const $name: Code = Code::new($code);)+
            }
        )+

        const ENTRIES: &[ErrorMetadata] = &[
            $($(ErrorMetadata {
                code: $code,
                category: $category,
                severity: Severity::$severity,
                recoverable: $recoverable,
                requires_halt: $halt,
                description: $description,
                recommended_action: $action,
            },)+)+
        ];
    };
}

registry! {
    /// `--config` and runtime preference failures
    config {
        CONFIG_READ_FAILURE = "E001", "Configuration", High, false, true,
            "Configuration file could not be read",
            "Check the --config path and its permissions";
        INVALID_CONFIGURATION = "E002", "Configuration", High, false, true,
            "Configuration file is not valid TOML for this tool",
            "Compare the file against the documented sections";
        INVALID_RAW_FUNCTION = "E003", "Configuration", Medium, false, true,
            "Raw directive name contains characters other than ASCII letters",
            "Use plain directive names such as 'verbatim' or 'js'";
    }

    /// Template loading failures
    file_processing {
        FILE_NOT_FOUND = "E005", "FileProcessing", Medium, false, true,
            "Template not found at the given path",
            "Check the path passed to blade-lex";
        INVALID_EXTENSION = "E006", "FileProcessing", Low, true, false,
            "File does not have a .blade or .blade.html extension",
            "Rename the template or disable the extension requirement";
        FILE_TOO_LARGE = "E007", "FileProcessing", High, false, true,
            "File exceeds the maximum template size",
            "Split the template into smaller partials";
        EMPTY_FILE = "E008", "FileProcessing", Low, true, false,
            "File is empty",
            "Add template content or remove the file";
        PERMISSION_DENIED = "E009", "FileProcessing", Medium, false, true,
            "Template is not readable by this process",
            "Check the file permissions";
        INVALID_ENCODING = "E010", "FileProcessing", Medium, false, true,
            "File is not valid UTF-8",
            "Re-save the template with UTF-8 encoding";
        IO_ERROR = "E011", "FileProcessing", Medium, false, true,
            "I/O error while reading file",
            "Retry or check the underlying storage";
        INVALID_PATH = "E012", "FileProcessing", Medium, false, true,
            "Path does not point to a regular file",
            "Pass the path of a template file";
    }

    /// Errors raised while tokenizing
    lexical {
        BRACKET_MISMATCH = "E020", "Lexical", High, false, true,
            "Closing bracket does not match the innermost open bracket",
            "Balance the brackets inside the directive or echo";
        UNTERMINATED_BLOCK = "E021", "Lexical", High, false, true,
            "Construct still open at end of input",
            "Close the comment, echo, argument list or raw block";
        NESTING_TOO_DEEP = "E022", "Lexical", High, false, true,
            "Brackets nested deeper than the configured limit",
            "Simplify the expression";
        TOO_MANY_TOKENS = "E023", "Lexical", Critical, false, true,
            "Template produced more tokens than the configured limit",
            "Split the template into smaller partials";
    }

    /// Completed operations, logged at info level
    success {
        SYSTEM_INITIALIZATION_COMPLETED = "I004", "System", Low, true, false,
            "Logging system initialized",
            "None";
        FILE_PROCESSING_SUCCESS = "I006", "FileProcessing", Low, true, false,
            "File read and validated",
            "None";
        TOKENIZATION_COMPLETE = "I020", "Lexical", Low, true, false,
            "Tokenization completed",
            "Token stream ready for parsing";
    }
}

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, &'static ErrorMetadata>> = OnceLock::new();

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    ERROR_REGISTRY
        .get_or_init(|| ENTRIES.iter().map(|entry| (entry.code, entry)).collect())
        .get(code)
        .copied()
}
