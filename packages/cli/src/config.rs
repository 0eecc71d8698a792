use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "paperclip.config.json";

/// Paperclip configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the JSON documents produced by the parser
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Report sibling nodes sharing provenance after every evaluation
    #[serde(default = "default_true")]
    pub validate_provenance: bool,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to source directory
    pub fn get_src_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.src_dir)
    }

    /// Locate an input document: as given, relative to `cwd`, then inside `srcDir`
    pub fn resolve_input(&self, cwd: &str, input: &str) -> PathBuf {
        let path = Path::new(input);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        let from_cwd = PathBuf::from(cwd).join(path);
        if from_cwd.exists() {
            return from_cwd;
        }

        let from_src = self.get_src_dir(cwd).join(path);
        if from_src.exists() {
            from_src
        } else {
            from_cwd
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            log_level: default_log_level(),
            validate_provenance: true,
            pretty: true,
        }
    }
}
