//! Pipeline orchestration: wires the preprocessor, lexer, parser, and the
//! two back ends together behind one `Session`, and owns the bounded-
//! timeout invocation of the out-of-scope external assembler/emulator.

pub mod config;
pub mod error;

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sc_interp::{BufferUart, Interpreter};
use sc_par::ast::Program;

pub use config::Config;
pub use error::PipelineError;

/// How many trailing lines of a failed external tool's combined
/// stdout/stderr get folded into [`PipelineError::ToolFailed`].
const TOOL_OUTPUT_TAIL_LINES: usize = 150;

/// Final interpreter state surfaced to callers after a run, since
/// `Interpreter` itself borrows the `Program` for its whole lifetime and
/// isn't worth keeping around once execution finishes.
#[derive(Debug, Clone)]
pub struct InterpretOutcome {
    pub result: u32,
    pub registers: [u32; 32],
    pub uart_output: Vec<u8>,
}

/// One toolchain invocation: loaded config plus the methods that drive the
/// pipeline stages. Stateless beyond `config` — each `run_*` call parses
/// its own source file fresh.
pub struct Session {
    pub config: Config,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session { config }
    }

    /// Runs the preprocessor, lexer, and parser over `path`, returning a
    /// validated AST.
    pub fn load_program(&self, path: &Path) -> Result<Program, PipelineError> {
        tracing::debug!(path = %path.display(), "preprocessing and lexing");
        let tokens = sc_lex::lex_file(path)?;
        if let Some(bad) = sc_lex::first_error(&tokens) {
            return Err(PipelineError::Lex {
                message: format!("{} at {}:{}", bad.text, bad.line, bad.column),
            });
        }

        tracing::debug!("parsing");
        let file = path.to_string_lossy().into_owned();
        let program = sc_par::parse(&tokens, Some(file))?;
        Ok(program)
    }

    /// Runs `path` to completion through the tree-walking interpreter.
    pub fn run_interpret(&self, path: &Path) -> Result<InterpretOutcome, PipelineError> {
        let program = self.load_program(path)?;
        tracing::debug!("interpreting");
        let mut interp: Interpreter<BufferUart> = Interpreter::new(&program);
        let result = interp.run()?;
        Ok(InterpretOutcome {
            result,
            registers: interp.registers().snapshot(),
            uart_output: interp.peripherals().uart.io().written.clone(),
        })
    }

    /// Runs `path` through the fixed-register-allocation code generator,
    /// producing the emitted assembly text.
    pub fn run_compile(&self, path: &Path) -> Result<String, PipelineError> {
        let program = self.load_program(path)?;
        tracing::debug!("emitting assembly");
        let asm = sc_gen::generate(&program)?;
        Ok(asm)
    }

    /// Spawns `command`, waits up to `self.config.tool_timeout_ms`, and
    /// returns the combined stdout/stderr on success. Killed and reported
    /// as [`PipelineError::ToolTimeout`] if it outlives the deadline.
    pub fn run_tool(&self, tool: &str, command: &mut Command) -> Result<String, PipelineError> {
        let timeout = Duration::from_millis(self.config.tool_timeout_ms);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|source| PipelineError::ToolSpawn {
                tool: tool.to_string(),
                source,
            })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|source| PipelineError::ToolSpawn {
                    tool: tool.to_string(),
                    source,
                })?
            {
                break status;
            }
            if start.elapsed() >= timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PipelineError::ToolTimeout {
                    tool: tool.to_string(),
                    timeout_ms: self.config.tool_timeout_ms,
                });
            }
            std::thread::sleep(Duration::from_millis(20));
        };

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            let _ = stdout.read_to_string(&mut output);
        }
        if let Some(mut stderr) = child.stderr.take() {
            let mut err = String::new();
            let _ = stderr.read_to_string(&mut err);
            output.push_str(&err);
        }

        if !status.success() {
            let tail: String = output
                .lines()
                .rev()
                .take(TOOL_OUTPUT_TAIL_LINES)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(PipelineError::ToolFailed {
                tool: tool.to_string(),
                code: status.code().unwrap_or(-1),
                tail,
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn run_interpret_executes_a_program_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "main.sc", "function main(){ return 6 * 7; }");
        let session = Session::new(Config::default());
        let outcome = session.run_interpret(&path).unwrap();
        assert_eq!(outcome.result, 42);
    }

    #[test]
    fn run_interpret_captures_uart_output() {
        let dir = TempDir::new().unwrap();
        let path = write_source(
            &dir,
            "main.sc",
            "function main(){ uart_write(72); uart_write(105); return 0; }",
        );
        let session = Session::new(Config::default());
        let outcome = session.run_interpret(&path).unwrap();
        assert_eq!(outcome.uart_output, b"Hi");
    }

    #[test]
    fn run_compile_emits_well_formed_assembly() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "main.sc", "function main(){ return 1 + 2; }");
        let session = Session::new(Config::default());
        let asm = session.run_compile(&path).unwrap();
        assert!(asm.contains("entry main"));
        assert!(asm.contains("hlt"));
    }

    #[test]
    fn compiling_the_same_program_twice_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "main.sc", "function main(){ return 1 + 2; }");
        let session = Session::new(Config::default());
        let first = session.run_compile(&path).unwrap();
        let second = session.run_compile(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn preprocessor_include_is_resolved_before_lexing() {
        let dir = TempDir::new().unwrap();
        write_source(&dir, "helper.sch", "function helper(){ return 5; }");
        let path = write_source(
            &dir,
            "main.sc",
            "#include \"helper.sch\"\nfunction main(){ return helper(); }",
        );
        let session = Session::new(Config::default());
        let outcome = session.run_interpret(&path).unwrap();
        assert_eq!(outcome.result, 5);
    }

    #[test]
    fn missing_source_file_is_an_io_error() {
        let session = Session::new(Config::default());
        let result = session.load_program(Path::new("/nonexistent/main.sc"));
        assert!(result.is_err());
    }

    #[test]
    fn run_tool_reports_a_timeout_as_exit_124_worthy_error() {
        let session = Session {
            config: Config {
                tool_timeout_ms: 50,
                ..Config::default()
            },
        };
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let result = session.run_tool("sleep", &mut cmd);
        assert!(matches!(result, Err(PipelineError::ToolTimeout { .. })));
    }

    #[test]
    fn run_tool_surfaces_a_nonzero_exit_status() {
        let session = Session::new(Config::default());
        let mut cmd = Command::new("false");
        let result = session.run_tool("false", &mut cmd);
        assert!(matches!(result, Err(PipelineError::ToolFailed { .. })));
    }
}
