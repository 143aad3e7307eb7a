use config::{Config, ConfigError, Environment, File};
use libece::Secret;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Api {
    pub url: Option<String>,
    pub mail: Option<String>,
    pub password: Option<Secret>,
    /// Request timeout in seconds
    pub timeout: u64,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    /// Report rejected credentials as a failure
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub auth: Auth,
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Settings {
    pub fn new(use_config_file: bool) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.timeout", DEFAULT_TIMEOUT_SECS)?
            .set_default("auth.strict", false)?;

        if use_config_file {
            builder = builder.add_source(File::with_name("ece").required(false));
        }

        // environment wins over the file
        let s = builder
            .add_source(
                Environment::with_prefix("ECE")
                    .try_parsing(true)
                    .separator("_"),
            )
            .build()?;
        s.try_deserialize()
    }
}
