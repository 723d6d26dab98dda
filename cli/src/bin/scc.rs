//! `scc` — the compiler front end.
//!
//! Lowers one `.sc` source file to ISA assembly text via the fixed-
//! register-allocation code generator, optionally running the result
//! through the out-of-scope external assembler and emulator.

use std::path::PathBuf;
use std::process::{Command, ExitCode};

use clap::Parser;
use sc_drv::{Config, Session};

/// Compiles an SC source file to ISA assembly.
#[derive(Parser, Debug)]
#[command(name = "scc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fixed-register-allocation code generator for the SC language")]
struct Args {
    /// Source file to compile
    source: PathBuf,

    /// Output assembly path (default: stdout)
    output: Option<PathBuf>,

    /// Assemble and run the emitted program through the external tools
    #[arg(long)]
    run: bool,

    /// Print the token stream to stderr and exit before parsing
    #[arg(long)]
    emit_tokens: bool,

    /// Print the parsed AST to stderr and exit before code generation
    #[arg(long)]
    emit_ast: bool,

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

    if args.emit_tokens {
        return match sc_lex::lex_file(&args.source) {
            Ok(tokens) => {
                eprintln!("{tokens:#?}");
                ExitCode::from(sc_cli::EXIT_OK as u8)
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(sc_cli::EXIT_ERROR as u8)
            }
        };
    }

    if args.emit_ast {
        return match session.load_program(&args.source) {
            Ok(program) => {
                eprintln!("{program:#?}");
                ExitCode::from(sc_cli::EXIT_OK as u8)
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(sc_cli::exit_code_for(&err) as u8)
            }
        };
    }

    let asm = match session.run_compile(&args.source) {
        Ok(asm) => asm,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(sc_cli::exit_code_for(&err) as u8);
        }
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.source.with_extension("asm"));

    if args.output.is_some() || args.run {
        if let Err(err) = std::fs::write(&output_path, &asm) {
            eprintln!("error: {}: {err}", output_path.display());
            return ExitCode::from(sc_cli::EXIT_ERROR as u8);
        }
    } else {
        println!("{asm}");
    }

    if !args.run {
        return ExitCode::from(sc_cli::EXIT_OK as u8);
    }

    let binary_path = output_path.with_extension("bin");
    let mut assemble = Command::new(&session.config.assembler_cmd);
    assemble.arg(&output_path).arg("-o").arg(&binary_path);
    if let Err(err) = session.run_tool(&session.config.assembler_cmd, &mut assemble) {
        eprintln!("error: {err}");
        return ExitCode::from(sc_cli::exit_code_for(&err) as u8);
    }

    let mut emulate = Command::new(&session.config.emulator_cmd);
    emulate
        .arg(&binary_path)
        .arg("--baud")
        .arg(session.config.default_uart_baud.to_string());
    match session.run_tool(&session.config.emulator_cmd, &mut emulate) {
        Ok(output) => {
            print!("{output}");
            ExitCode::from(sc_cli::EXIT_OK as u8)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(sc_cli::exit_code_for(&err) as u8)
        }
    }
}
