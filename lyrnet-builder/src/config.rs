//! Configuration for lyrnet-builder
//!
//! Network parameters are compile-time constants; only paths and the worker
//! pool size come from the root folder / TOML / command line.

use lyrnet_common::config::{RootFolderInitializer, TomlConfig};
use lyrnet_common::song::DATASET_FILE_NAME;
use lyrnet_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Co-occurrence window (odd, in phonemes)
pub const DEFAULT_WINDOW_SIZE: usize = 11;
/// Target average degree after pruning
pub const DEFAULT_K_EXPECTED: usize = 20;

/// CMU-format dictionary expected under the root folder
pub const DICTIONARY_FILE_NAME: &str = "cmudict.dict";
/// Artifacts live under `<root>/network/w{window}_k{k}/`
pub const NETWORK_DIR_NAME: &str = "network";

/// Window size and degree target for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    window_size: usize,
    k_expected: usize,
}

impl NetworkParams {
    /// Window size must be odd and at least 3 so that every vertex has a
    /// centred window and labels stay inside the phoneme sequence
    pub fn new(window_size: usize, k_expected: usize) -> Result<Self> {
        if window_size < 3 || window_size % 2 == 0 {
            return Err(Error::InvalidInput(format!(
                "window_size must be odd and >= 3, got {}",
                window_size
            )));
        }
        if k_expected == 0 {
            return Err(Error::InvalidInput("k_expected must be >= 1".to_string()));
        }
        Ok(Self {
            window_size,
            k_expected,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn k_expected(&self) -> usize {
        self.k_expected
    }

    /// Vertices trimmed at each end of the sequence
    pub fn margin(&self) -> usize {
        self.window_size / 2
    }

    /// floor(n * k_expected / 2)
    pub fn edge_budget(&self, vertex_count: usize) -> usize {
        vertex_count.saturating_mul(self.k_expected) / 2
    }

    /// Output subdirectory keyed by the parameters, e.g. `w11_k20`
    pub fn directory_name(&self) -> String {
        format!("w{}_k{}", self.window_size, self.k_expected)
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            k_expected: DEFAULT_K_EXPECTED,
        }
    }
}

/// Resolved paths and pool size for a builder run
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub root_folder: PathBuf,
    pub dataset_path: PathBuf,
    pub dictionary_path: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub params: NetworkParams,
}

impl BuilderConfig {
    /// Default layout under `root_folder`
    pub fn new(root_folder: &Path, params: NetworkParams) -> Self {
        Self {
            root_folder: root_folder.to_path_buf(),
            dataset_path: root_folder.join(DATASET_FILE_NAME),
            dictionary_path: root_folder.join(DICTIONARY_FILE_NAME),
            output_dir: network_dir(root_folder, &params),
            workers: default_workers(),
            params,
        }
    }

    /// Apply TOML `[builder]` settings and an optional command-line worker count
    pub fn resolve(
        root_folder: &Path,
        toml_config: &TomlConfig,
        workers_override: Option<usize>,
    ) -> Self {
        let initializer = RootFolderInitializer::new(root_folder.to_path_buf());
        let mut config = Self::new(root_folder, NetworkParams::default());

        if let Some(path) = &toml_config.builder.dataset_file {
            config.dataset_path = initializer.resolve_path(path);
        }
        if let Some(path) = &toml_config.builder.dictionary_file {
            config.dictionary_path = initializer.resolve_path(path);
        }
        if let Some(workers) = workers_override.or(toml_config.builder.workers) {
            config.workers = workers.max(1);
        }

        config
    }
}

/// `<root>/network/w{window}_k{k}`
pub fn network_dir(root_folder: &Path, params: &NetworkParams) -> PathBuf {
    root_folder
        .join(NETWORK_DIR_NAME)
        .join(params.directory_name())
}

/// Pool size matching available CPU parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrnet_common::config::BuilderSection;

    #[test]
    fn test_default_params() {
        let params = NetworkParams::default();
        assert_eq!(params.window_size(), 11);
        assert_eq!(params.k_expected(), 20);
        assert_eq!(params.margin(), 5);
        assert_eq!(params.directory_name(), "w11_k20");
    }

    #[test]
    fn test_params_validation() {
        assert!(NetworkParams::new(3, 1).is_ok());
        assert!(NetworkParams::new(1, 20).is_err());
        assert!(NetworkParams::new(10, 20).is_err());
        assert!(NetworkParams::new(11, 0).is_err());
    }

    #[test]
    fn test_edge_budget_floors() {
        let params = NetworkParams::new(11, 3).unwrap();
        assert_eq!(params.edge_budget(0), 0);
        assert_eq!(params.edge_budget(5), 7);
        assert_eq!(params.edge_budget(usize::MAX), usize::MAX / 2);
    }

    #[test]
    fn test_default_layout() {
        let config = BuilderConfig::new(Path::new("/data"), NetworkParams::default());
        assert_eq!(
            config.dataset_path,
            PathBuf::from("/data/wasabi_songs_without_genre_final.csv")
        );
        assert_eq!(config.dictionary_path, PathBuf::from("/data/cmudict.dict"));
        assert_eq!(config.output_dir, PathBuf::from("/data/network/w11_k20"));
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_resolve_applies_toml_and_override() {
        let toml_config = TomlConfig {
            builder: BuilderSection {
                dataset_file: Some(PathBuf::from("songs.tsv")),
                dictionary_file: Some(PathBuf::from("/dicts/cmu.dict")),
                workers: Some(8),
            },
            ..Default::default()
        };

        let config = BuilderConfig::resolve(Path::new("/data"), &toml_config, None);
        assert_eq!(config.dataset_path, PathBuf::from("/data/songs.tsv"));
        assert_eq!(config.dictionary_path, PathBuf::from("/dicts/cmu.dict"));
        assert_eq!(config.workers, 8);

        let config = BuilderConfig::resolve(Path::new("/data"), &toml_config, Some(2));
        assert_eq!(config.workers, 2);
    }
}
