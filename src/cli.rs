use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ember")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run Ember scripts, or start an interactive session", long_about = None)]
pub struct Args {
    /// Script to run; starts the REPL when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Print the token stream and exit
    #[arg(long = "tokens", requires = "file", conflicts_with = "ast")]
    pub tokens: bool,

    /// Print the syntax tree and exit
    #[arg(long = "ast", requires = "file")]
    pub ast: bool,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a shell completion script
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "Invalid color choice: {}. Must be 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

/// What the binary should do once arguments are parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Repl,
    Run(PathBuf),
    Tokens(PathBuf),
    Ast(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub color_enabled: bool,
    pub verbose: bool,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        let mode = match &args.file {
            None => Mode::Repl,
            Some(path) if args.tokens => Mode::Tokens(path.clone()),
            Some(path) if args.ast => Mode::Ast(path.clone()),
            Some(path) => Mode::Run(path.clone()),
        };

        AppConfig {
            mode,
            color_enabled,
            verbose: args.verbose,
        }
    }
}
