use crate::error::{BridgeError, BridgeResult};
use crate::schema::SchemaOptions;
use dws_core::ServiceLocation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const URL_KEY: &str = "URL";
pub const TIMEOUT_KEY: &str = "WebServiceTimeout";
pub const DYNAMIC_URL_KEY: &str = "WebServiceDynamicUrl";
pub const SKIP_UNSUPPORTED_KEY: &str = "Skip unsupported methods";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One entry of the configuration section a host shows to its users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigKey {
    pub name: &'static str,
    pub required: bool,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

pub const CONFIG_KEYS: [ConfigKey; 4] = [
    ConfigKey {
        name: URL_KEY,
        required: true,
        default: None,
        description: "Location of the web service description",
    },
    ConfigKey {
        name: TIMEOUT_KEY,
        required: false,
        default: Some("30"),
        description: "Timeout of a remote call in seconds",
    },
    ConfigKey {
        name: DYNAMIC_URL_KEY,
        required: false,
        default: Some("false"),
        description: "Allow each call to override the service endpoint",
    },
    ConfigKey {
        name: SKIP_UNSUPPORTED_KEY,
        required: false,
        default: Some("true"),
        description: "Leave out operations that cannot be flattened",
    },
];

/// Broker settings for one service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(rename = "URL")]
    pub url: ServiceLocation,
    #[serde(rename = "WebServiceTimeout", default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(rename = "WebServiceDynamicUrl", default)]
    pub dynamic_url: bool,
    #[serde(rename = "Skip unsupported methods", default = "default_skip")]
    pub skip_unsupported: bool,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_skip() -> bool {
    true
}

impl BrokerConfig {
    pub fn new(url: ServiceLocation) -> Self {
        Self {
            url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            dynamic_url: false,
            skip_unsupported: true,
        }
    }

    /// Read a host configuration section
    ///
    /// Keys match case-insensitively; unknown keys are ignored and blank values fall back
    /// to the default.
    pub fn from_settings<'a, I>(settings: I) -> BridgeResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut url = None;
        let mut timeout_secs = DEFAULT_TIMEOUT_SECS;
        let mut dynamic_url = false;
        let mut skip_unsupported = true;

        for (key, value) in settings {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key.eq_ignore_ascii_case(URL_KEY) {
                url = Some(value.parse::<ServiceLocation>().map_err(|e| {
                    BridgeError::Config(format!("{} '{}' is invalid: {}", URL_KEY, value, e))
                })?);
            } else if key.eq_ignore_ascii_case(TIMEOUT_KEY) {
                timeout_secs = value.parse().map_err(|_| {
                    BridgeError::Config(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        TIMEOUT_KEY, value
                    ))
                })?;
            } else if key.eq_ignore_ascii_case(DYNAMIC_URL_KEY) {
                dynamic_url = parse_flag(DYNAMIC_URL_KEY, value)?;
            } else if key.eq_ignore_ascii_case(SKIP_UNSUPPORTED_KEY) {
                skip_unsupported = parse_flag(SKIP_UNSUPPORTED_KEY, value)?;
            }
        }

        let url = url.ok_or_else(|| BridgeError::Config(format!("{} is required", URL_KEY)))?;
        let config = BrokerConfig {
            url,
            timeout_secs,
            dynamic_url,
            skip_unsupported,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.timeout_secs == 0 {
            return Err(BridgeError::Config(format!(
                "{} must be at least one second",
                TIMEOUT_KEY
            )));
        }
        Ok(())
    }

    pub fn location(&self) -> &ServiceLocation {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn schema_options(&self) -> SchemaOptions {
        SchemaOptions {
            skip_unsupported: self.skip_unsupported,
            dynamic_url: self.dynamic_url,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> BridgeResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(BridgeError::Config(format!(
            "{} must be true or false, got '{}'",
            key, value
        ))),
    }
}
