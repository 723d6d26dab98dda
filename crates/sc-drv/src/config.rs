//! `sc.toml` project configuration: CLI flags always take precedence over
//! a loaded file, which takes precedence over the built-in defaults below.

use std::path::{Path, PathBuf};

use dirs::{config_dir, home_dir};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const CONFIG_FILE_NAME: &str = "sc.toml";

fn default_isa_header() -> String {
    "isa.inc".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_uart_baud() -> u32 {
    9_600
}

fn default_assembler_cmd() -> String {
    "sc-asm".to_string()
}

fn default_emulator_cmd() -> String {
    "sc-emu".to_string()
}

/// Project-level defaults; CLI flags always take precedence over these,
/// which in turn take precedence over the built-in defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Path to the ISA header `include`d at the top of emitted assembly.
    #[serde(default = "default_isa_header")]
    pub isa_header: String,

    /// Default directory written assembly/artifacts land in.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// How long to wait for the external assembler/emulator before killing
    /// it and reporting exit code 124.
    #[serde(default = "default_timeout_ms")]
    pub tool_timeout_ms: u64,

    /// Default UART baud rate used by `scc --run` before the program calls
    /// `uart_set_baud`.
    #[serde(default = "default_uart_baud")]
    pub default_uart_baud: u32,

    /// External assembler invoked by `scc --run` before the emulator.
    #[serde(default = "default_assembler_cmd")]
    pub assembler_cmd: String,

    /// External emulator invoked by `scc --run` on the assembler's output.
    #[serde(default = "default_emulator_cmd")]
    pub emulator_cmd: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            isa_header: default_isa_header(),
            output_dir: default_output_dir(),
            tool_timeout_ms: default_timeout_ms(),
            default_uart_baud: default_uart_baud(),
            assembler_cmd: default_assembler_cmd(),
            emulator_cmd: default_emulator_cmd(),
        }
    }
}

impl Config {
    /// Searches, in order, the current directory, `$HOME/.config/sc/`, and
    /// the platform config directory; falls back to [`Config::default`] if
    /// none has an `sc.toml`.
    pub fn load() -> Result<Self, PipelineError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Io(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| PipelineError::Config(path.to_path_buf(), e))
    }

    fn check_current_dir_config() -> Option<PathBuf> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        path.exists().then_some(path)
    }

    fn check_home_config() -> Option<PathBuf> {
        home_dir()
            .map(|dir| dir.join(".config").join("sc").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn check_system_config() -> Option<PathBuf> {
        config_dir()
            .map(|dir| dir.join("sc").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::check_current_dir_config()
            .or_else(Self::check_home_config)
            .or_else(Self::check_system_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_sane_fallbacks() {
        let config = Config::default();
        assert_eq!(config.isa_header, "isa.inc");
        assert_eq!(config.tool_timeout_ms, 5_000);
        assert_eq!(config.default_uart_baud, 9_600);
    }

    #[test]
    fn load_from_path_reads_partial_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sc.toml");
        std::fs::write(&path, "tool_timeout_ms = 1500\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.tool_timeout_ms, 1500);
        assert_eq!(config.isa_header, "isa.inc");
    }

    #[test]
    fn load_from_missing_path_is_an_error() {
        let result = Config::load_from_path(Path::new("/nonexistent/sc.toml"));
        assert!(result.is_err());
    }
}
