use std::fmt;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use thiserror::Error;

use tracing::level_filters::LevelFilter;

use super::logging::{LogFormat, LoggingConfig, parse_level};

/// Optional YAML file read before the environment.
pub const CONFIG_FILE: &str = "./config.yaml";

/// Environment variables the exporter reads.
pub const ENV_KEYS: [&str; 9] = [
    "OUTLINE_API_URL",
    "OUTLINE_API_KEY",
    "LISTEN_ADDRESS",
    "METRICS_PATH",
    "SCRAPE_TIMEOUT",
    "PAGE_LIMIT",
    "DEBUG",
    "LOG_LEVEL",
    "LOG_FORMAT",
];

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_LISTEN_ADDRESS: &str = ":9877";
const DEFAULT_METRICS_PATH: &str = "/metrics";
const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PAGE_LIMIT: usize = 25;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error loading configuration: {0}")]
    Figment(#[from] figment::Error),

    #[error("OUTLINE_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("Invalid LOG_LEVEL '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Settings as found in the file and the environment, before defaults and
/// validation. Every value is kept as text so a malformed one can fall back
/// to its default instead of failing extraction.
#[derive(Deserialize, Debug, Default)]
pub struct RawConfig {
    #[serde(default, deserialize_with = "lenient")]
    pub outline_api_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub outline_api_key: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub listen_address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub metrics_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub scrape_timeout: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub page_limit: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub debug: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub log_level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub log_format: Option<String>,
}

/// Resolved exporter configuration, read-only after startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ExporterConfig {
    pub outline_api_url: String,
    pub outline_api_key: String,
    pub listen_address: String,
    pub metrics_path: String,
    /// Bound on every request made to the Outline API.
    pub scrape_timeout: Duration,
    pub page_limit: usize,
    pub debug: bool,
    pub logging: LoggingConfig,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            outline_api_url: DEFAULT_API_URL.to_string(),
            outline_api_key: String::new(),
            listen_address: normalize_listen_address(DEFAULT_LISTEN_ADDRESS),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
            page_limit: DEFAULT_PAGE_LIMIT,
            debug: false,
            logging: LoggingConfig::default(),
        }
    }
}

/// A configuration together with the warnings raised while resolving it.
///
/// Warnings are logged by the caller once logging is up.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ExporterConfig,
    pub warnings: Vec<String>,
}

/// Load config from `./config.yaml` (if present) overlaid with the environment.
pub fn load_config() -> Result<LoadedConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Yaml::file(CONFIG_FILE))
        .merge(Env::raw().only(&ENV_KEYS));
    ExporterConfig::from_figment(&figment)
}

impl ExporterConfig {
    pub fn from_figment(figment: &Figment) -> Result<LoadedConfig, ConfigError> {
        let raw: RawConfig = figment.extract()?;
        Self::resolve(raw)
    }

    /// Applies defaults and validation to raw settings.
    pub fn resolve(raw: RawConfig) -> Result<LoadedConfig, ConfigError> {
        let mut warnings = Vec::new();

        let outline_api_key = raw
            .outline_api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let scrape_timeout = parse_or_default(
            "SCRAPE_TIMEOUT",
            raw.scrape_timeout,
            parse_duration,
            DEFAULT_SCRAPE_TIMEOUT,
            &mut warnings,
        );
        let page_limit = parse_or_default(
            "PAGE_LIMIT",
            raw.page_limit,
            |value| value.trim().parse::<usize>().ok().filter(|limit| *limit > 0),
            DEFAULT_PAGE_LIMIT,
            &mut warnings,
        );
        let debug = parse_or_default("DEBUG", raw.debug, parse_bool, false, &mut warnings);

        let level = match raw.log_level {
            Some(level) => parse_level(&level).ok_or(ConfigError::InvalidLogLevel(level))?,
            None if debug => LevelFilter::DEBUG,
            None => LoggingConfig::default().level,
        };
        let format = match raw.log_format.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("console") => LogFormat::Console,
            Some("json") => LogFormat::Json,
            Some(other) => {
                warnings.push(format!(
                    "Invalid LOG_FORMAT: {}, using default: console",
                    other
                ));
                LogFormat::Console
            }
        };

        let metrics_path =
            normalize_metrics_path(raw.metrics_path.as_deref().unwrap_or(DEFAULT_METRICS_PATH));
        if metrics_path == "/health" {
            warnings.push(
                "METRICS_PATH is /health, the health check endpoint will not be served"
                    .to_string(),
            );
        }

        let config = ExporterConfig {
            outline_api_url: raw
                .outline_api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            outline_api_key,
            listen_address: normalize_listen_address(
                raw.listen_address
                    .as_deref()
                    .unwrap_or(DEFAULT_LISTEN_ADDRESS),
            ),
            metrics_path,
            scrape_timeout,
            page_limit,
            debug,
            logging: LoggingConfig {
                level,
                format,
                ..LoggingConfig::default()
            },
        };

        Ok(LoadedConfig { config, warnings })
    }
}

fn parse_or_default<T, F>(
    key: &str,
    raw: Option<String>,
    parse: F,
    default: T,
    warnings: &mut Vec<String>,
) -> T
where
    T: fmt::Debug,
    F: FnOnce(&str) -> Option<T>,
{
    let Some(value) = raw else {
        return default;
    };
    match parse(&value) {
        Some(parsed) => parsed,
        None => {
            warnings.push(format!(
                "Invalid value for {}: {}, using default: {:?}",
                key, value, default
            ));
            default
        }
    }
}

/// Parses `true/1/t/yes/y` and `false/0/f/no/n`, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "t" | "yes" | "y" => Some(true),
        "false" | "0" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parses a positive duration such as `10s`, `1m30s`, `250ms` or `1.5h`.
/// A bare number is taken as seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let seconds = match value.parse::<f64>() {
        Ok(seconds) => seconds,
        Err(_) => parse_unit_sequence(value)?,
    };
    if !(seconds.is_finite() && seconds > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

fn parse_unit_sequence(value: &str) -> Option<f64> {
    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = value;
    let mut total = 0.0;

    if rest.is_empty() {
        return None;
    }
    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let amount: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return None,
        };
        total += amount * scale;
        rest = &rest[unit_end..];
    }
    Some(total)
}

/// `:9877` binds every interface.
fn normalize_listen_address(address: &str) -> String {
    let address = address.trim();
    if address.starts_with(':') {
        format!("0.0.0.0{}", address)
    } else {
        address.to_string()
    }
}

fn normalize_metrics_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Accepts strings, numbers and booleans and keeps them as text.
///
/// The environment provider types values it can parse (`25` becomes an
/// integer, `true` a boolean) while `yes` or `10s` stay strings.
fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_char<E: de::Error>(self, v: char) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(LenientVisitor)
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}
