//! Polycalc CLI - line-editing REPL and one-shot evaluator
//!
//! This is a thin wrapper around polycalc-core that builds the executable.
//! Programs that need extra types or functions can assemble their own engine
//! from the core's builders instead.

mod repl;

use std::error::Error as StdError;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::debug;
use polycalc_core::{standard_engine, Calculator, Error, Notation};

#[derive(Parser)]
#[command(
    name = "polycalc",
    version,
    about = "Calculator for infix, prefix and postfix expressions",
    after_help = r#"
Examples:
  polycalc                                  # Start interactive REPL
  polycalc -e "1 + 2 * 3"                   # Evaluate one expression
  polycalc -n postfix -e "1 2 3 * +"        # Same, in postfix
  polycalc --show-code -e "sqrt(16) + 1"    # Print the compiled program too

Environment Variables:
  POLYCALC_NOTATION=postfix   Default notation
  POLYCALC_LOG=debug          Log level (error, warn, info, debug, trace)
"#
)]
struct Cli {
    /// Notation expressions are read in
    #[arg(short, long, env = "POLYCALC_NOTATION", default_value = "infix")]
    notation: Notation,

    /// Evaluate one expression, print the stack and exit
    #[arg(short, long, value_name = "EXPR")]
    eval: Option<String>,

    /// Print the compiled program before running it
    #[arg(long)]
    show_code: bool,

    /// Set log level
    #[arg(long, value_enum, env = "POLYCALC_LOG", default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Prints an error followed by its `source()` chain.
pub(crate) fn report_error(err: &dyn StdError) {
    eprintln!("Error: {}", err);
    let mut cause = err.source();
    while let Some(inner) = cause {
        eprintln!("  caused by: {}", inner);
        cause = inner.source();
    }
}

pub(crate) fn format_stack(calc: &Calculator) -> String {
    calc.stack()
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn evaluate_once(calc: &mut Calculator, source: &str, notation: Notation, show_code: bool) -> Result<(), Error> {
    let executable = calc.compile(source, notation)?;
    if show_code {
        println!("Code: {}", executable);
    }
    calc.execute(&executable)?;
    println!("{}", format_stack(calc));
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .filter_level(cli.log_level.into())
        .init();

    let engine = match standard_engine() {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            report_error(&err);
            return ExitCode::FAILURE;
        }
    };
    debug!("standard engine ready, notation {}", cli.notation);

    let mut calc = Calculator::new(engine);
    match cli.eval {
        Some(source) => match evaluate_once(&mut calc, &source, cli.notation, cli.show_code) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                report_error(&err);
                ExitCode::FAILURE
            }
        },
        None => match repl::run_repl(calc, cli.notation, cli.show_code) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                report_error(err.as_ref());
                ExitCode::FAILURE
            }
        },
    }
}
