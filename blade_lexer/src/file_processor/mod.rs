//! Template file loading
//!
//! Size limits are compile-time constants from the build profile; the
//! extension requirement and performance logging are runtime preferences.

mod processor;

use crate::config::compile_time::file_processing::{LARGE_FILE_THRESHOLD, MAX_FILE_SIZE};
use crate::config::runtime::FileProcessorPreferences;
pub use processor::{
    is_blade_template, template_extension, FileMetadata, FileProcessingResult, FileProcessor,
    FileProcessorError, BLADE_EXTENSIONS,
};

/// Load a template with preferences from the environment
pub fn process_file(file_path: &str) -> Result<FileProcessingResult, FileProcessorError> {
    FileProcessor::from_preferences(&FileProcessorPreferences::default()).process_file(file_path)
}

pub fn create_processor_from_preferences(prefs: &FileProcessorPreferences) -> FileProcessor {
    FileProcessor::from_preferences(prefs)
}

pub fn get_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

pub fn get_large_file_threshold() -> u64 {
    LARGE_FILE_THRESHOLD
}
