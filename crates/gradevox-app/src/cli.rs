//! CLI argument definitions for the gradevox binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Gradevox - replay spoken grading commands against a JSON roster.
#[derive(Parser, Debug)]
#[command(name = "gradevox", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Roster JSON file (`{"headers": [...], "rows": [...]}`).
    #[arg(short = 'r', long = "roster")]
    pub roster: PathBuf,

    /// Transcript script to replay. Reads stdin when omitted.
    #[arg(short = 's', long = "script")]
    pub script: Option<PathBuf>,

    /// Where to write the edited roster. Defaults to overwriting `--roster`.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Correction memory JSON file, loaded at start and saved at exit.
    #[arg(short = 'm', long = "memory")]
    pub memory: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Keep listening after each command until a stop phrase.
    #[arg(long = "continuous")]
    pub continuous: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > GRADEVOX_CONFIG env var > ~/.gradevox/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("GRADEVOX_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn resolve_output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| self.roster.clone())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".gradevox").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".gradevox").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let args = CliArgs::try_parse_from(["gradevox", "--roster", "class.json"]).unwrap();
        assert_eq!(args.roster, PathBuf::from("class.json"));
        assert!(args.script.is_none());
        assert!(!args.continuous);
        assert_eq!(args.resolve_output_path(), PathBuf::from("class.json"));
    }

    #[test]
    fn test_roster_is_required() {
        assert!(CliArgs::try_parse_from(["gradevox"]).is_err());
    }

    #[test]
    fn test_config_flag_wins() {
        let args = CliArgs::try_parse_from([
            "gradevox",
            "-r",
            "class.json",
            "-c",
            "/tmp/custom.toml",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/custom.toml"));
        assert_eq!(args.resolve_output_path(), PathBuf::from("out.json"));
    }

    #[test]
    fn test_default_config_path_ends_with_gradevox_dir() {
        let path = default_config_path();
        if path != PathBuf::from("config.toml") {
            assert!(path.ends_with(".gradevox/config.toml") || path.ends_with(".gradevox\\config.toml"));
        }
    }

    #[test]
    fn test_log_level_priority() {
        let args =
            CliArgs::try_parse_from(["gradevox", "-r", "class.json", "--log-level", "debug"]).unwrap();
        assert_eq!(args.resolve_log_level("warn"), "debug");

        let args = CliArgs::try_parse_from(["gradevox", "-r", "class.json"]).unwrap();
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }
}
