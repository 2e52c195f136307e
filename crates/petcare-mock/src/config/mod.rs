use crate::latency::LatencyProfile;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Mock layer configuration, usually loaded from YAML.
///
/// ```yaml
/// force_real: false
/// base_url: http://localhost:3000
/// latency: { min: 100, max: 500 }
/// fixtures_dir: ./fixtures
/// real_api_url: https://api.petcare.example
/// fallthrough_to_real: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MockConfig {
    /// Disable interception for the whole process.
    #[serde(default)]
    pub force_real: bool,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub latency: LatencyProfile,

    /// Directory holding fixture JSON files that replace the embedded ones.
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,

    #[serde(default)]
    pub real_api_url: Option<String>,

    /// Send "no data" mock results to the real API instead of failing.
    #[serde(default)]
    pub fallthrough_to_real: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            force_real: false,
            base_url: None,
            latency: LatencyProfile::default(),
            fixtures_dir: None,
            real_api_url: None,
            fallthrough_to_real: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl MockConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: MockConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.latency.validate().context("Invalid latency")?;

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.fallthrough_to_real && self.real_api_url.is_none() && self.base_url.is_none() {
            anyhow::bail!(
                "fallthrough_to_real requires 'real_api_url' or 'base_url' so requests have somewhere to go"
            );
        }

        for (field, url) in [
            ("base_url", &self.base_url),
            ("real_api_url", &self.real_api_url),
        ] {
            if let Some(url) = url {
                if !crate::request::has_scheme(url) {
                    anyhow::bail!("{field} must be an absolute http(s) URL, got '{url}'");
                }
            }
        }

        Ok(())
    }

    /// Base URL new clients should use.
    ///
    /// With interception forced off the real API URL wins; otherwise the
    /// configured base URL does.
    pub fn effective_base_url(&self) -> Option<String> {
        if self.force_real {
            self.real_api_url.clone().or_else(|| self.base_url.clone())
        } else {
            self.base_url.clone().or_else(|| self.real_api_url.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MockConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, MockConfig::default());
        assert_eq!(config.latency, LatencyProfile::Fixed(300));
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
force_real: true
base_url: http://localhost:3000
real_api_url: https://api.petcare.example
latency:
  min: 100
  max: 250
fixtures_dir: /tmp/fixtures
fallthrough_to_real: true
"#
        )
        .unwrap();

        let config = MockConfig::from_file(file.path()).unwrap();
        assert!(config.force_real);
        assert!(config.fallthrough_to_real);
        assert_eq!(
            config.latency,
            LatencyProfile::Range {
                min_ms: 100,
                max_ms: 250
            }
        );
        assert_eq!(config.fixtures_dir, Some(PathBuf::from("/tmp/fixtures")));
        assert_eq!(
            config.effective_base_url().as_deref(),
            Some("https://api.petcare.example")
        );
    }

    #[test]
    fn test_fixed_latency_from_yaml() {
        let config = MockConfig::from_yaml_str("latency: 0").unwrap();
        assert_eq!(config.latency, LatencyProfile::Fixed(0));
    }

    #[test]
    fn test_inverted_latency_range_rejected() {
        let err = MockConfig::from_yaml_str("latency: { min: 500, max: 100 }").unwrap_err();
        assert!(err.to_string().contains("Invalid latency"));
        assert!(format!("{err:#}").contains("min (500ms) is greater than max (100ms)"));
    }

    #[test]
    fn test_fallthrough_requires_target() {
        let err = MockConfig::from_yaml_str("fallthrough_to_real: true").unwrap_err();
        assert!(err.to_string().contains("fallthrough_to_real"));
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let err = MockConfig::from_yaml_str("base_url: /api").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(MockConfig::from_yaml_str("request_timeout_secs: 0").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(MockConfig::from_file("/nonexistent/petcare-mock.yaml").is_err());
    }

    #[test]
    fn test_effective_base_url_prefers_base_url_when_mocking() {
        let config = MockConfig {
            base_url: Some("http://localhost:3000".to_string()),
            real_api_url: Some("https://api.petcare.example".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.effective_base_url().as_deref(),
            Some("http://localhost:3000")
        );
    }
}
