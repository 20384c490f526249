use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Service configuration.
///
/// Layered as defaults, then an optional TOML file, then `SENTINEL_*`
/// environment variables; command-line flags are applied by `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Gallery file written by `sentinel enroll`.
    pub gallery_path: PathBuf,
    /// Euclidean distance below which a face counts as a match.
    pub threshold: f32,
    /// Number of frames in the identity smoothing window.
    pub window: usize,
    /// Directory receiving `events_*.csv`.
    pub log_dir: PathBuf,
    /// Directory receiving `unknown_*.jpg` face crops.
    pub snapshot_dir: PathBuf,
    /// Directory of frames (with detection sidecars) to process.
    pub frame_dir: PathBuf,
    /// Frames buffered between capture and the decision engine.
    pub queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gallery_path: PathBuf::from("encodings/gallery.json"),
            threshold: sentinel_core::DEFAULT_THRESHOLD,
            window: sentinel_core::DEFAULT_WINDOW,
            log_dir: PathBuf::from("logs"),
            snapshot_dir: PathBuf::from("snapshots"),
            frame_dir: PathBuf::from("frames"),
            queue_depth: 8,
        }
    }
}

/// TOML file shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    gallery_path: Option<PathBuf>,
    threshold: Option<f32>,
    window: Option<usize>,
    log_dir: Option<PathBuf>,
    snapshot_dir: Option<PathBuf>,
    frame_dir: Option<PathBuf>,
    queue_depth: Option<usize>,
}

impl Config {
    /// Defaults, then `file` (if given), then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = file {
            config.apply_file(path)?;
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(v) = file.gallery_path {
            self.gallery_path = v;
        }
        if let Some(v) = file.threshold {
            self.threshold = v;
        }
        if let Some(v) = file.window {
            self.window = v;
        }
        if let Some(v) = file.log_dir {
            self.log_dir = v;
        }
        if let Some(v) = file.snapshot_dir {
            self.snapshot_dir = v;
        }
        if let Some(v) = file.frame_dir {
            self.frame_dir = v;
        }
        if let Some(v) = file.queue_depth {
            self.queue_depth = v;
        }
        Ok(())
    }

    /// Override fields from environment-style lookups. Unparseable values are ignored.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SENTINEL_GALLERY_PATH") {
            self.gallery_path = PathBuf::from(v);
        }
        self.threshold = parse_or(&lookup, "SENTINEL_THRESHOLD", self.threshold);
        self.window = parse_or(&lookup, "SENTINEL_WINDOW", self.window);
        if let Some(v) = lookup("SENTINEL_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SENTINEL_SNAPSHOT_DIR") {
            self.snapshot_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SENTINEL_FRAME_DIR") {
            self.frame_dir = PathBuf::from(v);
        }
        self.queue_depth = parse_or(&lookup, "SENTINEL_QUEUE_DEPTH", self.queue_depth);
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
