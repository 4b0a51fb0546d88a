use std::path::PathBuf;

use axum::http::HeaderValue;
use encodrop_core::encoder::EncoderLocation;
use encodrop_core::ffmpeg::DEFAULT_FFMPEG_BINARY;
use encodrop_core::naming::DEFAULT_OUTPUT_SUFFIX;
use encodrop_core::token::DEFAULT_TOKEN_LENGTH;
use encodrop_pipeline::OrchestratorConfig;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Bridge configuration loaded from environment variables.
///
/// All fields have defaults suitable for running next to a local UI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `127.0.0.1`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Where the encoder binary lives.
    pub encoder: EncoderLocation,
    /// Inserted before the first `.` of a dropped file's name to build the
    /// destination path (default: `_unsafe`).
    pub output_suffix: String,
    /// Length of per-job tokens (default: `20`).
    pub token_length: usize,
    /// Upper bound on concurrently running encoders (default: unbounded).
    pub max_concurrent_jobs: Option<usize>,
    /// Treat a clean encoder exit as completion (default: `false`).
    pub finish_on_clean_exit: bool,
    /// FFmpeg executable used by the preflight probe (default: `ffmpeg`).
    pub ffmpeg_path: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `127.0.0.1`                |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `ENCODER_PATH`          | unset                      |
    /// | `ENCODER_RESOURCES_DIR` | unset                      |
    /// | `OUTPUT_SUFFIX`         | `_unsafe`                  |
    /// | `TOKEN_LENGTH`          | `20`                       |
    /// | `MAX_CONCURRENT_JOBS`   | unset (unbounded)          |
    /// | `FINISH_ON_CLEAN_EXIT`  | `false`                    |
    /// | `FFMPEG_PATH`           | `ffmpeg`                   |
    ///
    /// With neither `ENCODER_PATH` nor `ENCODER_RESOURCES_DIR` set, the
    /// encoder is expected next to the running executable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".into());

        let port: u16 = parse_or("PORT", var("PORT"), 3000)?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.clone(),
                reason: e.to_string(),
            })?;
        }

        let request_timeout_secs: u64 =
            parse_or("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS"), 30)?;

        let encoder = EncoderLocation::from_overrides(
            var("ENCODER_PATH").map(PathBuf::from),
            var("ENCODER_RESOURCES_DIR").map(PathBuf::from),
        );

        let output_suffix = lookup("OUTPUT_SUFFIX").unwrap_or_else(|| DEFAULT_OUTPUT_SUFFIX.into());
        if output_suffix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "OUTPUT_SUFFIX",
                value: output_suffix,
                reason: "must not be empty, or outputs would overwrite their sources".into(),
            });
        }
        if output_suffix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                var: "OUTPUT_SUFFIX",
                value: output_suffix,
                reason: "must not contain path separators".into(),
            });
        }

        let token_length: usize =
            parse_or("TOKEN_LENGTH", var("TOKEN_LENGTH"), DEFAULT_TOKEN_LENGTH)?;
        if token_length == 0 {
            return Err(ConfigError::Invalid {
                var: "TOKEN_LENGTH",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let max_concurrent_jobs = match var("MAX_CONCURRENT_JOBS") {
            None => None,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => Some(limit),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: "MAX_CONCURRENT_JOBS",
                        value: raw,
                        reason: "must be at least 1".into(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "MAX_CONCURRENT_JOBS",
                        value: raw,
                        reason: e.to_string(),
                    })
                }
            },
        };

        let finish_on_clean_exit = match var("FINISH_ON_CLEAN_EXIT") {
            None => false,
            Some(raw) => parse_bool("FINISH_ON_CLEAN_EXIT", raw)?,
        };

        let ffmpeg_path = var("FFMPEG_PATH").unwrap_or_else(|| DEFAULT_FFMPEG_BINARY.into());

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            encoder,
            output_suffix,
            token_length,
            max_concurrent_jobs,
            finish_on_clean_exit,
            ffmpeg_path,
        })
    }

    /// Orchestrator tunables derived from this configuration.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            token_length: self.token_length,
            max_concurrent_jobs: self.max_concurrent_jobs,
            finish_on_clean_exit: self.finish_on_clean_exit,
        }
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(var: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "expected true or false".into(),
        }),
    }
}
