//! Configuration for the generation service connection and session

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use log::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_HEALTH_PATH: &str = "/docs";
pub const DEFAULT_NOTIFICATION_WINDOW_MS: u64 = 3000;

pub const BASE_URL_ENV: &str = "TESTOPS_BASE_URL";
pub const TIMEOUT_ENV: &str = "TESTOPS_TIMEOUT_SECS";

/// Copilot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopilotConfig
{   /// Generation service base address
    pub base_url: String
  , /// Path probed by the liveness check
    pub health_path: String
  , /// How long a liveness notification stays visible
    pub notification_window_ms: u64
  , /// Request timeout in seconds; unset keeps the client default
    pub timeout_secs: Option<u64>
}

impl Default for CopilotConfig
{   fn default() -> Self
    {   CopilotConfig
        {   base_url: DEFAULT_BASE_URL.to_string()
          , health_path: DEFAULT_HEALTH_PATH.to_string()
          , notification_window_ms: DEFAULT_NOTIFICATION_WINDOW_MS
          , timeout_secs: None
        }
    }
}

impl CopilotConfig
{   /// Config pointing at `base_url`, everything else default
    pub fn with_base_url(base_url: impl Into<String>) -> Self
    {   CopilotConfig
        {   base_url: base_url.into()
          , ..CopilotConfig::default()
        }
    }

    /// Load from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: &Path)
      -> Result<Self, crate::error::Error>
    {   debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })
    }

    /// Apply `TESTOPS_BASE_URL` / `TESTOPS_TIMEOUT_SECS` when set
    pub fn with_env_overrides(self)
      -> Result<Self, crate::error::Error>
    {   self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F)
      -> Result<Self, crate::error::Error>
    where F: Fn(&str) -> Option<String>
    {   if let Some(url) = lookup(BASE_URL_ENV)
        {   debug!("{} overrides base_url", BASE_URL_ENV);
            self.base_url = url;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV)
        {   let secs = raw.trim().parse::<u64>().map_err(|_| {
              crate::error::Error::InvalidConfiguration(
                format!("{} must be whole seconds, got {:?}", TIMEOUT_ENV, raw)
              )
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(self)
    }

    /// Reject settings the session cannot run with
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if !(self.base_url.starts_with("http://")
          || self.base_url.starts_with("https://"))
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!("base_url must be http(s): {}", self.base_url)
            ));
        }
        if !self.health_path.starts_with('/')
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!("health_path must start with '/': {}", self.health_path)
            ));
        }
        if self.notification_window_ms == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "notification_window_ms must be positive".to_string()
            ));
        }
        if self.timeout_secs == Some(0)
        {   return Err(crate::error::Error::InvalidConfiguration(
              "timeout_secs must be positive".to_string()
            ));
        }
        Ok(())
    }

    /// `base_url` joined with `path`, tolerating a trailing slash
    pub fn url_for(&self, path: &str) -> String
    {   format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn notification_window(&self) -> Duration
    {   Duration::from_millis(self.notification_window_ms)
    }

    pub fn timeout(&self) -> Option<Duration>
    {   self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn defaults_target_local_service()
    {   let config = CopilotConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.health_path, "/docs");
        assert_eq!(config.notification_window(), Duration::from_secs(3));
        assert_eq!(config.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults()
    {   let config: CopilotConfig = serde_json::from_str(
          r#"{ "base_url": "http://copilot.internal:9000" }"#
        ).unwrap();
        assert_eq!(config.base_url, "http://copilot.internal:9000");
        assert_eq!(config.notification_window_ms, 3000);
    }

    #[test]
    fn env_overrides_apply()
    {   let config = CopilotConfig::default()
          .with_overrides_from(|key| match key
          {   BASE_URL_ENV => Some("https://gen.example".to_string())
            , TIMEOUT_ENV => Some("45".to_string())
            , _ => None
          })
          .unwrap();
        assert_eq!(config.base_url, "https://gen.example");
        assert_eq!(config.timeout_secs, Some(45));
    }

    #[test]
    fn bad_timeout_override_is_rejected()
    {   let result = CopilotConfig::default()
          .with_overrides_from(|key| (key == TIMEOUT_ENV)
            .then(|| "soon".to_string()));
        assert!(matches!(
          result,
          Err(crate::error::Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn validate_rejects_non_http_and_zero_window()
    {   let config = CopilotConfig::with_base_url("ftp://host");
        assert!(config.validate().is_err());

        let mut config = CopilotConfig::default();
        config.notification_window_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout()
    {   let mut config = CopilotConfig::default();
        config.timeout_secs = Some(0);
        assert!(matches!(
          config.validate(),
          Err(crate::error::Error::InvalidConfiguration(_))
        ));

        let config = CopilotConfig::default()
          .with_overrides_from(|key| (key == TIMEOUT_ENV)
            .then(|| "0".to_string()))
          .unwrap();
        assert!(config.validate().is_err());

        let config = CopilotConfig
        {   timeout_secs: Some(1)
          , ..CopilotConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_for_strips_trailing_slash()
    {   let config = CopilotConfig::with_base_url("http://h:1/");
        assert_eq!(config.url_for("/docs"), "http://h:1/docs");
    }
}
