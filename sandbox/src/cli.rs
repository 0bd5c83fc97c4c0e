//! Command-line interface of the `hostlink` binary.

use std::path::PathBuf;

use clap::Parser;
use hostlink_hostapi::types::{DEFAULT_KEY_STORE, DEFAULT_STRING_STORE};

use crate::config::{SandboxConfig, DEFAULT_MODULE_PATH};

/// Run a compiled module against the Hostlink bridge.
///
/// Arguments after the module path are forwarded verbatim to the module.
#[derive(Parser, Debug)]
#[command(name = "hostlink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the compiled module
    #[arg(default_value = DEFAULT_MODULE_PATH)]
    pub wasm: PathBuf,

    /// Arguments forwarded to the module
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Key-store file
    #[arg(long, env = "HOSTLINK_KEY_STORE", default_value = DEFAULT_KEY_STORE)]
    pub key_store: PathBuf,

    /// Scratch string-store file
    #[arg(long, env = "HOSTLINK_STRING_STORE", default_value = DEFAULT_STRING_STORE)]
    pub string_store: PathBuf,

    /// Instruction fuel limit (unlimited when absent)
    #[arg(long, env = "HOSTLINK_FUEL")]
    pub fuel: Option<u64>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Sandbox configuration for this invocation.
    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig {
            fuel_limit: self.fuel,
            key_store_path: self.key_store.clone(),
            string_store_path: self.string_store.clone(),
            ..SandboxConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["hostlink"]).unwrap();
        assert_eq!(cli.wasm, PathBuf::from(DEFAULT_MODULE_PATH));
        assert!(cli.args.is_empty());
        assert!(!cli.verbose);
        assert_eq!(cli.fuel, None);
    }

    #[test]
    fn test_trailing_args_forwarded_verbatim() {
        let cli =
            Cli::try_parse_from(["hostlink", "app.wasm", "encrypt", "--key", "-x"]).unwrap();
        assert_eq!(cli.wasm, PathBuf::from("app.wasm"));
        assert_eq!(cli.args, vec!["encrypt", "--key", "-x"]);
    }

    #[test]
    fn test_options_before_module() {
        let cli = Cli::try_parse_from([
            "hostlink",
            "-v",
            "--fuel",
            "1000",
            "--key-store",
            "/tmp/keys.txt",
            "app.wasm",
        ])
        .unwrap();
        assert!(cli.verbose);
        let config = cli.sandbox_config();
        assert_eq!(config.fuel_limit, Some(1000));
        assert_eq!(config.key_store_path, PathBuf::from("/tmp/keys.txt"));
        assert_eq!(config.string_store_path, PathBuf::from(DEFAULT_STRING_STORE));
    }
}
