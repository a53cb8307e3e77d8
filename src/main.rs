use clap::Parser;
use ember::cli::{generate_completions, AppConfig, Args, Commands, Mode};
use ember::diagnostic::render_error;
use ember::interpreter::{parse, parse_and_run, Interpreter};
use ember::lexer::tokenize;
use ember::repl::Repl;
use ember::{dump_program, EmberError};
use owo_colors::OwoColorize;
use std::io::{self, ErrorKind};
use std::path::Path;

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    init_logging(&config);

    std::process::exit(run(&config));
}

fn init_logging(config: &AppConfig) {
    let mut builder = env_logger::Builder::from_default_env();
    if config.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

/// Runs the selected mode and returns the process exit code.
fn run(config: &AppConfig) -> i32 {
    log::debug!("mode: {:?}", config.mode);
    match &config.mode {
        Mode::Repl => run_repl(config),
        Mode::Run(path) => run_file(path, config),
        Mode::Tokens(path) => print_tokens(path, config),
        Mode::Ast(path) => print_ast(path, config),
    }
}

fn run_repl(config: &AppConfig) -> i32 {
    let mut interpreter = Interpreter::new();
    // No read-ahead and no held lock: `input()` inside a submission reads
    // from the same stdin buffer.
    let stdin = io::BufReader::with_capacity(1, io::stdin());
    let mut repl = Repl::new(stdin, io::stdout(), io::stderr(), config.color_enabled);
    match repl.run(&mut interpreter) {
        Ok(()) => 0,
        Err(e) => {
            error_message(config, &format!("Error reading input: {}", e));
            1
        }
    }
}

fn run_file(path: &Path, config: &AppConfig) -> i32 {
    let Some(source) = read_source(path, config) else {
        return 1;
    };
    let mut interpreter = Interpreter::new();
    match parse_and_run(&source, &mut interpreter) {
        Ok(()) => 0,
        Err(error) => report(&source, path, &error, config),
    }
}

fn print_tokens(path: &Path, config: &AppConfig) -> i32 {
    let Some(source) = read_source(path, config) else {
        return 1;
    };
    match tokenize(&source) {
        Ok(tokens) => {
            for token in &tokens {
                println!("{}", token);
            }
            0
        }
        Err(error) => report(&source, path, &error, config),
    }
}

fn print_ast(path: &Path, config: &AppConfig) -> i32 {
    let Some(source) = read_source(path, config) else {
        return 1;
    };
    match tokenize(&source).and_then(parse) {
        Ok(program) => {
            print!("{}", dump_program(&program));
            0
        }
        Err(error) => report(&source, path, &error, config),
    }
}

fn read_source(path: &Path, config: &AppConfig) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error_message(config, &format!("Error: file not found: {}", path.display()));
            None
        }
        Err(e) => {
            error_message(config, &format!("Error reading file: {}", e));
            None
        }
    }
}

fn report(source: &str, path: &Path, error: &EmberError, config: &AppConfig) -> i32 {
    let file_name = path.display().to_string();
    eprint!("{}", render_error(source, &file_name, error, config.color_enabled));
    1
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
