use colossus_core::predict::PredictorConfig;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root replay configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReplayConfig {
    pub run_id: String,
    /// JSON-lines game log to replay.
    pub events: String,
    /// Kill-value table (YAML or JSON map). The standard roster is used
    /// when absent.
    #[serde(default)]
    pub roster: Option<String>,
    #[serde(default)]
    pub engine: PredictorConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReplayConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ReplayConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        validate_path("events", &self.run_id, &self.events)?;
        if let Some(roster) = self.roster.as_ref() {
            validate_path("roster", &self.run_id, roster)?;
        }
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        if let Some(telemetry) = self.logging.telemetry_jsonl.as_ref() {
            validate_path("logging.telemetry_jsonl", &self.run_id, telemetry)?;
            if telemetry == &self.outputs.guesses_jsonl || telemetry == &self.outputs.summary_md {
                return Err(ValidationError::InvalidField {
                    field: "logging.telemetry_jsonl".to_string(),
                    message: "telemetry must not overwrite a replay output".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            events: resolve_template(&self.run_id, &self.events),
            roster: self
                .roster
                .as_ref()
                .map(|roster| resolve_template(&self.run_id, roster)),
            guesses_jsonl: resolve_template(&self.run_id, &self.outputs.guesses_jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            telemetry_jsonl: self.telemetry_path(),
        }
    }

    /// Structured logs default to `<run_id>.telemetry.jsonl` beside the
    /// summary unless `logging.telemetry_jsonl` names a template.
    fn telemetry_path(&self) -> PathBuf {
        if let Some(template) = self.logging.telemetry_jsonl.as_ref() {
            return resolve_template(&self.run_id, template);
        }
        let summary = resolve_template(&self.run_id, &self.outputs.summary_md);
        summary
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!("{}.telemetry.jsonl", self.run_id))
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub guesses_jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        validate_path("outputs.guesses_jsonl", run_id, &self.guesses_jsonl)?;
        validate_path("outputs.summary_md", run_id, &self.summary_md)?;
        if self.guesses_jsonl == self.summary_md {
            return Err(ValidationError::InvalidField {
                field: "outputs".to_string(),
                message: "guesses and summary must be written to different files".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    /// Telemetry file template; `{run_id}` is substituted.
    #[serde(default)]
    pub telemetry_jsonl: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            telemetry_jsonl: None,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_path(label: &str, run_id: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: label.to_string(),
            message: "path must not be empty".to_string(),
        });
    }

    if resolve_template(run_id, value).components().count() == 0 {
        return Err(ValidationError::InvalidField {
            field: label.to_string(),
            message: "resolved path is invalid".to_string(),
        });
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved input and output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub events: PathBuf,
    pub roster: Option<PathBuf>,
    pub guesses_jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub telemetry_jsonl: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
