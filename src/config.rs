//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! Nothing here is global: the loaded [`Config`] is passed explicitly to the judge,
//! the problem store and the cache.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_CONCURRENCY, DEFAULT_PROBLEM_CACHE_PATH,
    DEFAULT_PROBLEMS_DIR, DEFAULT_RUN_TIMEOUT_MS, DEFAULT_WORKSPACE_DIR, languages,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub judge: JudgeConfig,
    pub docker: DockerConfig,
    pub log_filter: String,
}

/// Problem store and staging locations
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root of the on-disk problem store
    pub problems_dir: PathBuf,
    /// JSON cache of loaded problem definitions
    pub problem_cache_path: PathBuf,
    /// Directory under which staging directories are created
    pub workspace_dir: PathBuf,
}

/// Orchestration settings
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Size of the worker pool; 0 means one task per test case with no cap
    pub max_concurrency: usize,
    /// Wall-clock limit for a single sandboxed run
    pub run_timeout: Duration,
    /// Cancel sibling test cases as soon as one fails
    pub cancel_on_mismatch: bool,
}

/// Docker connection and image overrides
#[derive(Debug, Clone, Default)]
pub struct DockerConfig {
    /// Socket path; the bollard defaults are used when unset
    pub socket_path: Option<String>,
    /// Language tag -> image, overriding the built-in table
    pub images: HashMap<String, String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            storage: StorageConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
            docker: DockerConfig::from_env()?,
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            judge: JudgeConfig::default(),
            docker: DockerConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            problems_dir: PathBuf::from(
                env::var("PROBLEMS_DIR").unwrap_or_else(|_| DEFAULT_PROBLEMS_DIR.to_string()),
            ),
            problem_cache_path: PathBuf::from(
                env::var("PROBLEM_CACHE_PATH")
                    .unwrap_or_else(|_| DEFAULT_PROBLEM_CACHE_PATH.to_string()),
            ),
            workspace_dir: PathBuf::from(
                env::var("WORKSPACE_DIR").unwrap_or_else(|_| DEFAULT_WORKSPACE_DIR.to_string()),
            ),
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            problems_dir: PathBuf::from(DEFAULT_PROBLEMS_DIR),
            problem_cache_path: PathBuf::from(DEFAULT_PROBLEM_CACHE_PATH),
            workspace_dir: PathBuf::from(DEFAULT_WORKSPACE_DIR),
        }
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_concurrency: parse_var("MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?,
            run_timeout: Duration::from_millis(parse_var(
                "RUN_TIMEOUT_MS",
                DEFAULT_RUN_TIMEOUT_MS,
            )?),
            cancel_on_mismatch: parse_var("CANCEL_ON_MISMATCH", false)?,
        })
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            run_timeout: Duration::from_millis(DEFAULT_RUN_TIMEOUT_MS),
            cancel_on_mismatch: false,
        }
    }
}

impl DockerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let images = languages::ALL
            .iter()
            .filter_map(|lang| {
                env::var(image_var(lang))
                    .ok()
                    .map(|image| (lang.to_string(), image))
            })
            .collect();

        Ok(Self {
            socket_path: env::var("DOCKER_SOCKET").ok(),
            images,
        })
    }
}

/// Environment variable overriding the image of a language
fn image_var(language: &str) -> String {
    format!("IMAGE_{}", language.to_uppercase())
}

/// Parse an optional environment variable, falling back to `default`
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
