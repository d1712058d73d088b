use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    pub timezone: String,
    pub services_file: String,
    pub horizon_days: u32,
    pub max_occurrences: usize,
    pub church_name: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_AUTH_TOKEN -> auth_token
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("timezone", "UTC")?
            .set_default("services_file", "services.toml")?
            .set_default("horizon_days", 731)?
            .set_default("max_occurrences", 52)?
            .set_default("church_name", "Church Services")?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.tz()?;
        Ok(settings)
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| ConfigError::Message(format!("invalid timezone: {err}")))
    }
}
