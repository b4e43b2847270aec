//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `LYRNET_ROOT_FOLDER`
//! 3. `root_folder` key of the TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or broken TOML file never aborts startup: it is reported with a
//! warning and the compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "LYRNET_ROOT_FOLDER";

/// Directory name used under the platform config directory
const CONFIG_DIR_NAME: &str = "lyrnet";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Values used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    /// The data folder is relative to the working directory on every platform,
    /// so a checkout run from its own directory finds `data/` next to it.
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: PathBuf::from("data"),
            log_level: "info".to_string(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    CompiledDefaults::for_current_platform().log_level
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[builder]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuilderSection {
    /// Dataset file, relative paths are resolved against the root folder
    pub dataset_file: Option<PathBuf>,
    /// CMU-format pronunciation dictionary
    pub dictionary_file: Option<PathBuf>,
    /// Worker pool size (defaults to available parallelism)
    pub workers: Option<usize>,
}

/// `[crawler]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlerSection {
    pub base_url: Option<String>,
    pub batch_size: Option<usize>,
    pub checkpoint_every: Option<usize>,
    pub rate_limit_backoff_secs: Option<u64>,
    pub requests_per_second: Option<u32>,
}

/// TOML configuration file contents
///
/// Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub builder: BuilderSection,
    #[serde(default)]
    pub crawler: CrawlerSection,
}

/// Candidate config file locations, in lookup order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    if cfg!(unix) {
        paths.push(PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths
}

/// Parse a specific TOML config file
pub fn load_toml_config_from(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io("Cannot read config", path, e))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the first config file found, falling back to defaults
pub fn load_toml_config() -> TomlConfig {
    for path in default_config_paths() {
        if !path.exists() {
            continue;
        }
        match load_toml_config_from(&path) {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                return TomlConfig::default();
            }
        }
    }
    TomlConfig::default()
}

/// Resolves the root folder from CLI, environment, TOML and defaults
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_config: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_config: None,
        }
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Use an already loaded config instead of searching the default paths
    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_config = Some(config.clone());
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                debug!(module = %self.module_name, "Root folder from {}", ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        let toml_root = match &self.toml_config {
            Some(config) => config.root_folder.clone(),
            None => load_toml_config().root_folder,
        };
        if let Some(path) = toml_root {
            debug!(module = %self.module_name, "Root folder from TOML config");
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and checks that it can be written to
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Resolve a configured path: absolute paths are kept, relative ones are
    /// joined onto the root folder
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_folder.join(path)
        }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        ensure_writable_dir(&self.root_folder)
    }
}

/// Create `dir` (and parents) and verify a file can be created inside it
pub fn ensure_writable_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io("Cannot create directory", dir, e))?;
    tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io("Cannot write to directory", dir, e))?;
    Ok(())
}
