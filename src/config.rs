// Credentials and API settings
//
// Loaded once at startup. `AVAILABILITY_`-prefixed environment variables,
// with `__` between section and key (AVAILABILITY_REDEAM_API__API_KEY),
// take priority over the INI file.

use std::fmt;
use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{AvailabilityError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
pub const DEFAULT_BASE_URL: &str = "https://booking.sandbox.redeam.io";
pub const ENV_PREFIX: &str = "AVAILABILITY";

/// API key pair sent with every request.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    // No timeout unless configured
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub redeam_api: Credentials,
    #[serde(default)]
    pub api: ApiSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.redeam_api.api_key.trim().is_empty() {
            return Err(AvailabilityError::Config(
                "redeam_api.api_key is empty".to_string(),
            ));
        }
        if self.redeam_api.api_secret.trim().is_empty() {
            return Err(AvailabilityError::Config(
                "redeam_api.api_secret is empty".to_string(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(AvailabilityError::Config("api.base_url is empty".to_string()));
        }
        Ok(())
    }
}
