// build.rs - turns config/<profile>.toml into `compile_time::*` constants
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
    file_processing: FileProcessing,
    lexical: Lexical,
    logging: Logging,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct FileProcessing {
    max_file_size: u64,
    large_file_threshold: u64,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Lexical {
    max_bracket_depth: usize,
    max_token_count: usize,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Logging {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=BLADE_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=BLADE_CONFIG_DIR");

    if let Err(message) = run() {
        panic!("{}", message);
    }
}

fn run() -> Result<(), String> {
    let profile_name = env::var("BLADE_BUILD_PROFILE").unwrap_or_else(|_| "development".into());
    let path = profile_path(&profile_name)?;
    println!("cargo:rerun-if-changed={}", path.display());

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("cannot read build profile {}: {}", path.display(), e))?;
    let profile: Profile = toml::from_str(&content)
        .map_err(|e| format!("invalid build profile {}: {}", path.display(), e))?;

    let problems = check(&profile);
    if !problems.is_empty() {
        return Err(format!(
            "build profile {} is inconsistent:\n  - {}",
            path.display(),
            problems.join("\n  - ")
        ));
    }

    let out_dir = env::var("OUT_DIR").map_err(|e| format!("OUT_DIR: {}", e))?;
    let output = Path::new(&out_dir).join("constants.rs");
    fs::write(&output, render(&profile, &profile_name))
        .map_err(|e| format!("cannot write {}: {}", output.display(), e))
}

/// Profiles live beside the workspace manifest, one directory above this crate
fn profile_path(profile_name: &str) -> Result<PathBuf, String> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_err(|e| e.to_string())?;
    let config_dir = env::var("BLADE_CONFIG_DIR").unwrap_or_else(|_| "config".into());
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .ok_or_else(|| format!("{} has no parent directory", manifest_dir))?;

    let path = workspace_root
        .join(config_dir)
        .join(format!("{}.toml", profile_name));
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("build profile not found: {}", path.display()))
    }
}

/// Every relation the lexer and file loader rely on
fn check(profile: &Profile) -> Vec<String> {
    let files = &profile.file_processing;
    let lexical = &profile.lexical;
    let logging = &profile.logging;
    let mut problems = Vec::new();

    if files.max_file_size == 0 {
        problems.push("max_file_size must be positive".to_string());
    }
    if files.large_file_threshold > files.max_file_size {
        problems.push(format!(
            "large_file_threshold ({}) exceeds max_file_size ({})",
            files.large_file_threshold, files.max_file_size
        ));
    }
    // the enclosing `(` of an argument list is depth 1
    if lexical.max_bracket_depth == 0 {
        problems.push("max_bracket_depth must be at least 1".to_string());
    }
    // a single Eof token must always fit
    if lexical.max_token_count == 0 {
        problems.push("max_token_count must be at least 1".to_string());
    }
    if logging.log_buffer_size == 0 {
        problems.push("log_buffer_size must be at least 1".to_string());
    }
    if logging.max_log_message_length < 64 {
        problems.push(format!(
            "max_log_message_length ({}) is below 64",
            logging.max_log_message_length
        ));
    }

    problems
}

fn render(profile: &Profile, profile_name: &str) -> String {
    let mut code = format!("// Generated by build.rs from the `{}` profile\n\n", profile_name);
    code.push_str("pub mod compile_time {\n");

    let sections: [(&str, Vec<(&str, &str, String)>); 3] = [
        (
            "file_processing",
            vec![
                ("MAX_FILE_SIZE", "u64", profile.file_processing.max_file_size.to_string()),
                (
                    "LARGE_FILE_THRESHOLD",
                    "u64",
                    profile.file_processing.large_file_threshold.to_string(),
                ),
            ],
        ),
        (
            "lexical",
            vec![
                ("MAX_BRACKET_DEPTH", "usize", profile.lexical.max_bracket_depth.to_string()),
                ("MAX_TOKEN_COUNT", "usize", profile.lexical.max_token_count.to_string()),
            ],
        ),
        (
            "logging",
            vec![
                ("LOG_BUFFER_SIZE", "usize", profile.logging.log_buffer_size.to_string()),
                (
                    "MAX_LOG_MESSAGE_LENGTH",
                    "usize",
                    profile.logging.max_log_message_length.to_string(),
                ),
            ],
        ),
    ];

    for (module, constants) in sections {
        let _ = writeln!(code, "    pub mod {} {{", module);
        for (name, ty, value) in constants {
            let _ = writeln!(code, "        pub const {}: {} = {};", name, ty, value);
        }
        code.push_str("    }\n");
    }

    code.push_str("}\n");
    code
}
