use std::path::{Path, PathBuf};

use crate::error::{EmotionError, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MODEL_PATH: &str = "model/emotion_model.json";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for the HTTP service.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    addr: String,
    model_path: PathBuf,
    allow_origin: Option<String>,
    strict_status: bool,
    max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            allow_origin: Some("*".to_string()),
            strict_status: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `EMOTION_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Same as `from_env`, over an explicit set of variables.
    ///
    /// Recognized: `EMOTION_ADDR`, `EMOTION_MODEL`, `EMOTION_ALLOW_ORIGIN`
    /// (empty disables CORS headers), `EMOTION_STRICT_STATUS`,
    /// `EMOTION_MAX_BODY_BYTES`.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            match key.as_str() {
                "EMOTION_ADDR" => config.addr = value,
                "EMOTION_MODEL" => config.model_path = PathBuf::from(value),
                "EMOTION_ALLOW_ORIGIN" => {
                    config.allow_origin = if value.is_empty() { None } else { Some(value) };
                }
                "EMOTION_STRICT_STATUS" => config.strict_status = parse_bool(&key, &value)?,
                "EMOTION_MAX_BODY_BYTES" => {
                    config.max_body_bytes = value.parse().map_err(|_| {
                        EmotionError::Config(format!("{key} must be a byte count, got {value:?}"))
                    })?;
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Set the listen address (e.g., "0.0.0.0:5000").
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the model file path.
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the `Access-Control-Allow-Origin` value, or `None` to omit it.
    pub fn with_allow_origin(mut self, origin: Option<String>) -> Self {
        self.allow_origin = origin;
        self
    }

    /// Use 400/500 for failed predictions instead of always 200.
    pub fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    // Getters
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn allow_origin(&self) -> Option<&str> {
        self.allow_origin.as_deref()
    }

    pub fn strict_status(&self) -> bool {
        self.strict_status
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(EmotionError::Config(format!("{key} must be a boolean, got {value:?}"))),
    }
}
