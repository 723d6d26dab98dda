//! Shared setup for the `sci`/`scc` binaries: logging init and the exit
//! code convention (`0` success, `1` pipeline error, `124` tool timeout).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_TIMEOUT: i32 = 124;

/// Initializes `tracing`: `-v` raises the default filter from `info` to
/// `debug`, `SC_LOG` always overrides both.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("SC_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// Maps a [`sc_drv::PipelineError`] to the process exit code it should
/// produce: tool timeouts get `124`, everything else gets `1`.
pub fn exit_code_for(err: &sc_drv::PipelineError) -> i32 {
    match err {
        sc_drv::PipelineError::ToolTimeout { .. } => EXIT_TIMEOUT,
        _ => EXIT_ERROR,
    }
}
