use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use axum::http::HeaderName;
use thiserror::Error;

const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
const DEFAULT_API_KEY: &str = "test-api-key-12345";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must {requirement}")]
    Constraint {
        key: &'static str,
        requirement: &'static str,
    },
}

/// Process-wide settings, built once at startup and handed to each component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
    /// Lower-cased, without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub api_key_header: HeaderName,
    pub enable_api_key: bool,
    pub api_key: String,
    pub confidence_threshold: f64,
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub log_dir: PathBuf,
    pub analysis_seed: Option<u64>,
}

impl Settings {
    /// Loads settings from the process environment, after applying a `.env`
    /// file if one is present in the working directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./uploads"));

        let max_file_size = parse_or(&lookup, "MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        if max_file_size == 0 {
            return Err(ConfigError::Constraint {
                key: "MAX_FILE_SIZE",
                requirement: "be greater than zero",
            });
        }

        let allowed_extensions: Vec<String> = lookup("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|| "jpg,jpeg,png".into())
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        if allowed_extensions.is_empty() {
            return Err(ConfigError::Constraint {
                key: "ALLOWED_EXTENSIONS",
                requirement: "list at least one extension",
            });
        }

        let header = lookup("API_KEY_HEADER").unwrap_or_else(|| "X-API-Key".into());
        let api_key_header = HeaderName::from_bytes(header.to_ascii_lowercase().as_bytes())
            .map_err(|_| ConfigError::Invalid {
                key: "API_KEY_HEADER",
                value: header.clone(),
            })?;

        let enable_api_key = match lookup("ENABLE_API_KEY") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                key: "ENABLE_API_KEY",
                value: raw,
            })?,
            None => true,
        };

        let api_key = lookup("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.into());
        if enable_api_key && api_key.is_empty() {
            return Err(ConfigError::Constraint {
                key: "API_KEY",
                requirement: "be set when ENABLE_API_KEY is true",
            });
        }

        let confidence_threshold = parse_or(&lookup, "CONFIDENCE_THRESHOLD", 0.6_f64)?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::Constraint {
                key: "CONFIDENCE_THRESHOLD",
                requirement: "be between 0 and 1",
            });
        }

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 8000_u16)?;

        let body_limit_mb = parse_or(&lookup, "BODY_LIMIT_MB", 10_usize)?;
        let body_limit_bytes = body_limit_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::Invalid {
                key: "BODY_LIMIT_MB",
                value: body_limit_mb.to_string(),
            })?;
        // Oversized files must reach the upload validator, not the transport limit.
        if body_limit_bytes <= max_file_size {
            return Err(ConfigError::Constraint {
                key: "BODY_LIMIT_MB",
                requirement: "exceed MAX_FILE_SIZE",
            });
        }

        let log_dir = lookup("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./logs"));

        let analysis_seed = match lookup("ANALYSIS_SEED") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "ANALYSIS_SEED",
                value: raw,
            })?),
            None => None,
        };

        Ok(Settings {
            upload_dir,
            max_file_size,
            allowed_extensions,
            api_key_header,
            enable_api_key,
            api_key,
            confidence_threshold,
            host,
            port,
            body_limit_bytes,
            log_dir,
            analysis_seed,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            key: "HOST",
            value: self.host.clone(),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = settings_from(&[]).unwrap();

        assert_eq!(settings.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(settings.max_file_size, 5 * 1024 * 1024);
        assert_eq!(settings.allowed_extensions, vec!["jpg", "jpeg", "png"]);
        assert_eq!(settings.api_key_header.as_str(), "x-api-key");
        assert!(settings.enable_api_key);
        assert_eq!(settings.api_key, "test-api-key-12345");
        assert_eq!(settings.confidence_threshold, 0.6);
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.analysis_seed, None);
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_from(&[
            ("UPLOAD_DIR", "/tmp/images"),
            ("MAX_FILE_SIZE", "1024"),
            ("ALLOWED_EXTENSIONS", " PNG, .Gif ,"),
            ("API_KEY_HEADER", "X-Custom-Token"),
            ("ENABLE_API_KEY", "off"),
            ("API_KEY", "secret"),
            ("PORT", "5020"),
            ("BODY_LIMIT_MB", "2"),
            ("ANALYSIS_SEED", "42"),
        ])
        .unwrap();

        assert_eq!(settings.upload_dir, PathBuf::from("/tmp/images"));
        assert_eq!(settings.max_file_size, 1024);
        assert_eq!(settings.allowed_extensions, vec!["png", "gif"]);
        assert_eq!(settings.api_key_header.as_str(), "x-custom-token");
        assert!(!settings.enable_api_key);
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.port, 5020);
        assert_eq!(settings.body_limit_bytes, 2 * 1024 * 1024);
        assert_eq!(settings.analysis_seed, Some(42));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = settings_from(&[("MAX_FILE_SIZE", "five")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MAX_FILE_SIZE", .. }));

        let err = settings_from(&[("PORT", "70000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn constraints_are_enforced() {
        assert!(settings_from(&[("MAX_FILE_SIZE", "0")]).is_err());
        assert!(settings_from(&[("ALLOWED_EXTENSIONS", " , ")]).is_err());
        assert!(settings_from(&[("CONFIDENCE_THRESHOLD", "1.5")]).is_err());
        assert!(settings_from(&[("API_KEY", "")]).is_err());
        assert!(settings_from(&[("API_KEY", ""), ("ENABLE_API_KEY", "false")]).is_ok());
        assert!(settings_from(&[("API_KEY_HEADER", "bad header")]).is_err());
        assert!(settings_from(&[("ENABLE_API_KEY", "maybe")]).is_err());
    }

    #[test]
    fn overflowing_body_limit_is_rejected() {
        let huge = usize::MAX.to_string();
        let err = settings_from(&[("BODY_LIMIT_MB", huge.as_str())]).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "BODY_LIMIT_MB", .. }));
    }

    #[test]
    fn body_limit_must_exceed_max_file_size() {
        let err = settings_from(&[("BODY_LIMIT_MB", "5")]).unwrap_err();
        assert!(matches!(err, ConfigError::Constraint { key: "BODY_LIMIT_MB", .. }));

        let err = settings_from(&[("MAX_FILE_SIZE", "20971520"), ("BODY_LIMIT_MB", "10")]).unwrap_err();
        assert!(matches!(err, ConfigError::Constraint { key: "BODY_LIMIT_MB", .. }));

        let settings = settings_from(&[("MAX_FILE_SIZE", "20971520"), ("BODY_LIMIT_MB", "21")]).unwrap();
        assert_eq!(settings.body_limit_bytes, 21 * 1024 * 1024);
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let settings = settings_from(&[("HOST", "127.0.0.1"), ("PORT", "9000")]).unwrap();
        assert_eq!(settings.bind_addr().unwrap().to_string(), "127.0.0.1:9000");

        let settings = settings_from(&[("HOST", "not a host")]).unwrap();
        assert!(settings.bind_addr().is_err());
    }
}
