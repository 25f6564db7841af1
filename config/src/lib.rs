//! Configuration for repsq.
//!
//! Raw TOML sections deserialize into `Option`-heavy structs; [`RepsqConfig::resolve`]
//! turns them into a fully-populated [`Settings`] with defaults and clamping
//! applied, so downstream code never sees a missing or out-of-range value.
//!
//! ```toml
//! [limits]
//! safe_digits_exact = 20000
//! worker_hard_timeout_ms = 10000
//! warning_threshold_ms = 2000
//!
//! [trace]
//! max_bytes = 5242880
//!
//! [preview]
//! window = 50
//! samples = 200
//!
//! [engine]
//! backend = "thread"
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use tempfile::NamedTempFile;
use thiserror::Error;

pub use repsq_core::DEFAULT_TRACE_MAX_BYTES;
pub use repsq_core::preview::{MAX_SAMPLES as MAX_PREVIEW_SAMPLES, MAX_WINDOW as MAX_PREVIEW_WINDOW};

/// Mirrors the scheduler's own defaults; the CLI pins the two together.
pub const DEFAULT_SAFE_DIGITS_EXACT: usize = 20_000;
pub const DEFAULT_HARD_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_WARNING_THRESHOLD_MS: u64 = 2_000;

/// Environment variable that overrides `[engine] backend`.
pub const BACKEND_ENV_VAR: &str = "REPSQ_BACKEND";

#[derive(Debug, Default, Deserialize)]
pub struct RepsqConfig {
    pub limits: Option<LimitsConfig>,
    pub trace: Option<TraceConfig>,
    pub preview: Option<PreviewConfig>,
    pub engine: Option<EngineConfig>,
}

/// Adaptive limits, normally written by an external benchmarking step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LimitsConfig {
    /// Largest root length `auto` mode still computes exactly.
    pub safe_digits_exact: Option<usize>,
    /// Default job timeout budget.
    pub worker_hard_timeout_ms: Option<u64>,
    /// Completed jobs slower than this are logged as slow.
    pub warning_threshold_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TraceConfig {
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviewConfig {
    pub window: Option<usize>,
    pub samples: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    pub backend: Option<BackendKind>,
}

/// Which kind of execution context runs jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Blocking thread in this process; terminated by detaching plus an interrupt flag.
    #[default]
    Thread,
    /// `repsq worker` child process; terminated by killing it.
    Process,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Thread => "thread",
            BackendKind::Process => "process",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "thread" | "threads" => Some(BackendKind::Thread),
            "process" | "subprocess" => Some(BackendKind::Process),
            _ => None,
        }
    }

    /// Interpret a `REPSQ_BACKEND` value. Unknown values are logged and ignored.
    fn from_override(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        let parsed = Self::parse(raw);
        if parsed.is_none() {
            tracing::warn!(value = %raw, "Unknown {BACKEND_ENV_VAR} value, ignoring");
        }
        parsed
    }
}

/// Fully resolved settings. Every field is populated and in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub safe_digits_exact: usize,
    pub hard_timeout: Duration,
    pub warning_threshold: Duration,
    pub trace_max_bytes: usize,
    pub preview_window: usize,
    pub preview_samples: usize,
    pub backend: BackendKind,
}

impl Default for Settings {
    fn default() -> Self {
        RepsqConfig::default().resolve_without_env()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    NoHome,
    #[error("failed to read config at {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to edit config at {path:?}: {source}")]
    Edit {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("failed to write config at {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::NoHome => None,
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Edit { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
        }
    }
}

impl RepsqConfig {
    /// Load `~/.repsq/config.toml`. `Ok(None)` when there is no home dir or no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        Self::parse(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve with defaults, clamping, and the `REPSQ_BACKEND` override.
    #[must_use]
    pub fn resolve(&self) -> Settings {
        self.resolve_with_override(env::var(BACKEND_ENV_VAR).ok().as_deref())
    }

    /// Resolve as [`resolve`](Self::resolve) does, with `backend_override`
    /// standing in for the environment variable.
    #[must_use]
    pub fn resolve_with_override(&self, backend_override: Option<&str>) -> Settings {
        let mut settings = self.resolve_without_env();
        if let Some(backend) = BackendKind::from_override(backend_override) {
            settings.backend = backend;
        }
        settings
    }

    fn resolve_without_env(&self) -> Settings {
        let limits = self.limits.unwrap_or_default();
        let trace = self.trace.as_ref().and_then(|t| t.max_bytes);
        let preview = self.preview.as_ref();

        Settings {
            safe_digits_exact: limits
                .safe_digits_exact
                .unwrap_or(DEFAULT_SAFE_DIGITS_EXACT),
            hard_timeout: Duration::from_millis(
                limits
                    .worker_hard_timeout_ms
                    .unwrap_or(DEFAULT_HARD_TIMEOUT_MS)
                    .max(1),
            ),
            warning_threshold: Duration::from_millis(
                limits
                    .warning_threshold_ms
                    .unwrap_or(DEFAULT_WARNING_THRESHOLD_MS),
            ),
            trace_max_bytes: trace.unwrap_or(DEFAULT_TRACE_MAX_BYTES),
            preview_window: preview
                .and_then(|p| p.window)
                .unwrap_or(MAX_PREVIEW_WINDOW)
                .clamp(1, MAX_PREVIEW_WINDOW),
            preview_samples: preview
                .and_then(|p| p.samples)
                .unwrap_or(MAX_PREVIEW_SAMPLES)
                .clamp(1, MAX_PREVIEW_SAMPLES),
            backend: self
                .engine
                .as_ref()
                .and_then(|e| e.backend)
                .unwrap_or_default(),
        }
    }

    /// Write the provided `[limits]` values to the user config file.
    pub fn persist_limits(update: &LimitsConfig) -> Result<PathBuf, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoHome)?;
        persist_limits_at(&path, update)?;
        Ok(path)
    }
}

/// Merge `update` into the `[limits]` table of the file at `path`.
///
/// Uses `toml_edit` so comments and unrelated tables survive, and replaces
/// the file atomically (temp file + rename). Creates the file and its parent
/// directory when missing.
pub fn persist_limits_at(path: &Path, update: &LimitsConfig) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let content = if path.exists() {
        fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        String::new()
    };

    let mut doc = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|source| ConfigError::Edit {
            path: path.to_path_buf(),
            source,
        })?;

    if !doc.contains_key("limits") {
        doc["limits"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    if let Some(value) = update.safe_digits_exact {
        doc["limits"]["safe_digits_exact"] = toml_edit::value(saturating_i64(value as u64));
    }
    if let Some(value) = update.worker_hard_timeout_ms {
        doc["limits"]["worker_hard_timeout_ms"] = toml_edit::value(saturating_i64(value));
    }
    if let Some(value) = update.warning_threshold_ms {
        doc["limits"]["warning_threshold_ms"] = toml_edit::value(saturating_i64(value));
    }

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(doc.to_string().as_bytes())
        .map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;

    tracing::info!(path = %path.display(), ?update, "Persisted limits");
    Ok(())
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".repsq").join("config.toml"))
}

/// Directory for log files, next to the config file.
#[must_use]
pub fn log_dir() -> Option<PathBuf> {
    config_path()
        .as_deref()
        .and_then(Path::parent)
        .map(|dir| dir.join("logs"))
}
