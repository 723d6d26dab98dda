//! `sci` — the interpreter front end.
//!
//! Runs one `.sc` source file to completion through the tree-walking
//! interpreter and prints its return value.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sc_drv::{Config, Session};

/// Interprets an SC source file directly, without code generation.
#[derive(Parser, Debug)]
#[command(name = "sci")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tree-walking interpreter for the SC language")]
struct Args {
    /// Source file to interpret
    source: PathBuf,

    /// Print the final register file and peripheral state after the
    /// program halts
    #[arg(long)]
    dump_registers: bool,

    /// Enable debug-level logging
    #[arg(short, long, env = "SC_VERBOSE")]
    verbose: bool,

    /// Path to an `sc.toml` config file, overriding the normal search path
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    sc_cli::init_logging(args.verbose);

    let config = match args.config.as_deref().map(Config::load_from_path) {
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            eprintln!("error: {err}");
            return ExitCode::from(sc_cli::EXIT_ERROR as u8);
        }
        None => Config::load().unwrap_or_default(),
    };

    let session = Session::new(config);
    match session.run_interpret(&args.source) {
        Ok(outcome) => {
            println!("{}", outcome.result);
            if args.dump_registers {
                for (i, value) in outcome.registers.iter().enumerate() {
                    println!("r{i} = {value}");
                }
            }
            ExitCode::from(sc_cli::EXIT_OK as u8)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(sc_cli::exit_code_for(&err) as u8)
        }
    }
}
