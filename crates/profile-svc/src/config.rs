//! Configuration loading and validation for the profile service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use fieldcrypt::FieldKey;
use serde::Deserialize;

/// Validated profile service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Standard base64 of the 32-byte field encryption key. **Required.**
    pub field_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// YAML file describing the path groups to encrypt. The built-in profile
    /// policy is used when unset.
    #[serde(default)]
    pub path_groups_file: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("field_key", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("path_groups_file", &self.path_groups_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decode the configured field key.
    ///
    /// # Errors
    ///
    /// Returns an error if `FIELD_KEY` is not base64 of exactly 32 bytes.
    pub fn field_key(&self) -> Result<FieldKey> {
        FieldKey::from_base64(&self.field_key).context("FIELD_KEY is invalid")
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.field_key.trim().is_empty() {
            anyhow::bail!("FIELD_KEY is required and must not be empty");
        }
        self.field_key()?;

        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        if let Some(path) = &self.path_groups_file {
            if path.trim().is_empty() {
                anyhow::bail!("PATH_GROUPS_FILE must not be empty when set");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of 32 0x42 bytes
    const KEY_B64: &str = "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=";

    fn config(field_key: &str) -> Config {
        Config {
            field_key: field_key.into(),
            listen_port: default_listen_port(),
            path_groups_file: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_listen_port(), 8080);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_good_key() {
        let cfg = config(KEY_B64);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.field_key().unwrap().as_bytes(), [0x42u8; 32]);
    }

    #[test]
    fn validate_rejects_empty_key() {
        assert!(config("").validate().is_err());
    }

    #[test]
    fn validate_rejects_short_key() {
        // base64 of 16 bytes
        assert!(config("QkJCQkJCQkJCQkJCQkJCQg==").validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_port() {
        let mut cfg = config(KEY_B64);
        cfg.listen_port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", config(KEY_B64));
        assert!(!rendered.contains(KEY_B64));
        assert!(rendered.contains("REDACTED"));
    }
}
