use blade_lexer::config::runtime::{parse_name_list, RuntimeConfig};
use blade_lexer::file_processor;
use blade_lexer::lexical::{self, LexicalMetrics};
use blade_lexer::logging;
use blade_lexer::tokens::TokenStream;
use std::env;
use std::process;

#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    input: String,
    json: bool,
    strict: bool,
    raw_functions: Option<Vec<String>>,
    config_path: Option<String>,
    show_metrics: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("blade-lex");

    if args.len() < 2 {
        eprintln!("Usage: {} <template> [options]", program);
        eprintln!("       {} --help", program);
        process::exit(1);
    }

    if args[1] == "--help" {
        print_help(program);
        return Ok(());
    }

    let options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };

    let config = match load_config(&options) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    };

    logging::init_global_logging(&config.logging)?;

    let processor = file_processor::create_processor_from_preferences(&config.file_processor);
    let file_result = match processor.process_file(&options.input) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("FAILED: {}", error);
            process::exit(1);
        }
    };

    match lexical::tokenize_file_result_with_preferences(file_result, config.lexical) {
        Ok((stream, metrics)) => {
            if options.json {
                println!("{}", serde_json::to_string_pretty(stream.all_tokens())?);
            } else {
                print_token_table(&stream);
            }
            if options.show_metrics {
                print_metrics(&metrics);
            }
        }
        Err(error) => {
            eprintln!("{}", error.render());
            process::exit(1);
        }
    }

    Ok(())
}

fn print_help(program_name: &str) {
    println!("Blade template lexer v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    {} <template> [options]", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help              Show this help message");
    println!("    --json              Print tokens as JSON");
    println!("    --strict            Reject unterminated comments, echoes, argument lists and raw blocks");
    println!("    --raw a,b,...       Directives whose bodies are raw (default: js,verbatim)");
    println!("    --config FILE       Load runtime preferences from a TOML file");
    println!("    --metrics           Print token statistics after the tokens");
    println!();
    println!("EXAMPLES:");
    println!("    {} resources/views/app.blade.html", program_name);
    println!("    {} page.blade --json --raw verbatim,js,markdown", program_name);
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => options.json = true,
            "--strict" => options.strict = true,
            "--metrics" => options.show_metrics = true,
            "--raw" => {
                let value = args.get(i + 1).ok_or("--raw requires a comma-separated list")?;
                options.raw_functions = Some(parse_name_list(value));
                i += 1;
            }
            "--config" => {
                let value = args.get(i + 1).ok_or("--config requires a file path")?;
                options.config_path = Some(value.clone());
                i += 1;
            }
            flag if flag.starts_with("--") => {
                eprintln!("Warning: Unknown option '{}'", flag);
            }
            path if options.input.is_empty() => options.input = path.to_string(),
            extra => return Err(format!("unexpected argument '{}'", extra)),
        }
        i += 1;
    }

    if options.input.is_empty() {
        return Err("no template file given".to_string());
    }
    Ok(options)
}

/// Runtime preferences from `--config` (or the environment), then flags
fn load_config(options: &CliOptions) -> Result<RuntimeConfig, blade_lexer::config::ConfigError> {
    let mut config = match &options.config_path {
        Some(path) => RuntimeConfig::from_toml_file(path)?,
        None => RuntimeConfig::default(),
    };

    if let Some(names) = &options.raw_functions {
        config.lexical = config.lexical.with_raw_functions(names.iter().cloned());
    }
    if options.strict {
        config.lexical = config.lexical.strict(true);
    }

    config.lexical.validate()?;
    Ok(config)
}

fn print_token_table(stream: &TokenStream) {
    println!("{:<10} {:<13} TOKEN", "POSITION", "KIND");
    for token in stream.all_tokens() {
        println!(
            "{:<10} {:<13} {:?}",
            token.span.start.to_string(),
            token.value.kind().as_str(),
            token.value.to_string()
        );
    }
}

fn print_metrics(metrics: &LexicalMetrics) {
    println!();
    println!("Tokens: {}", metrics.total_tokens);
    println!("  text: {}", metrics.text_tokens);
    println!("  data: {} ({} filters)", metrics.data_tokens, metrics.filter_count);
    println!("  comments: {}", metrics.comment_tokens);
    println!("  functions: {}", metrics.function_tokens);
    println!("  raw functions: {}", metrics.raw_function_tokens);
    println!("Max bracket depth: {}", metrics.max_bracket_depth);
    println!("Longest raw block: {} chars", metrics.longest_raw_block);
}
