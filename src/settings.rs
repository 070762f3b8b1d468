use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub store_url: Url,
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    /// IANA zone the studio operates in; decides what "today" is.
    pub timezone: String,
    pub calendar_name: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_STORE_URL, APP_AUTH_TOKEN, ...
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .set_default("store_url", "http://localhost:8081")?
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("timezone", "UTC")?
            .set_default("calendar_name", "Studio Schedule")?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.studio_timezone()?;
        Ok(settings)
    }

    pub fn studio_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Message(format!("unknown timezone {:?}", self.timezone)))
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const KEYS: [&str; 4] = ["APP_AUTH_TOKEN", "APP_PORT", "APP_TIMEZONE", "APP_STORE_URL"];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.timezone, "UTC");
        assert_eq!(settings.store_url.as_str(), "http://localhost:8081/");
        assert_eq!(settings.studio_timezone().unwrap(), Tz::UTC);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("APP_AUTH_TOKEN", "s3cret");
            std::env::set_var("APP_PORT", "9090");
            std::env::set_var("APP_TIMEZONE", "America/Chicago");
            std::env::set_var("APP_STORE_URL", "https://store.example.com/v1");
        }
        let settings = Settings::from_env().unwrap();
        clear_env();

        assert_eq!(settings.auth_token, "s3cret");
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.studio_timezone().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(settings.store_url.host_str(), Some("store.example.com"));
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_timezone() {
        clear_env();
        unsafe { std::env::set_var("APP_TIMEZONE", "Mars/Olympus") };
        let result = Settings::from_env();
        clear_env();
        assert!(result.is_err());
    }
}
