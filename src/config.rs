// In: src/config.rs

//! Where to find libsfh, and the few tunables of a header handle.
//!
//! `SfhConfig` is built once at the application boundary (a JSON file, the
//! process environment, or Python keyword arguments) and handed to
//! `LibSfh::from_config` / `ShotfileHeader::from_config`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SfhError;

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "SFH_CONFIG";
/// Environment variable naming the shared library directly.
pub const LIBRARY_ENV: &str = "SFH_LIBRARY";
/// Environment variable carrying the site/platform identifier.
pub const SITE_ENV: &str = "SYS";

const SITE_PLACEHOLDER: &str = "{site}";

//==================================================================================
// I. The Unified SfhConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SfhConfig {
    /// Explicit path to the shared library. Takes precedence over `site`.
    #[serde(default)]
    pub library_path: Option<PathBuf>,

    /// Site/platform identifier substituted into `install_template`.
    #[serde(default)]
    pub site: Option<String>,

    /// Install location with a `{site}` placeholder.
    #[serde(default = "default_install_template")]
    pub install_template: String,

    /// Number of slots requested from `sfhlonam_` when listing objects.
    #[serde(default = "default_object_list_capacity")]
    pub object_list_capacity: usize,
}

impl Default for SfhConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            site: None,
            install_template: default_install_template(),
            object_list_capacity: default_object_list_capacity(),
        }
    }
}

fn default_install_template() -> String {
    "/afs/ipp-garching.mpg.de/aug/ads/{site}/lib64/libsfh8.so".to_string()
}

fn default_object_list_capacity() -> usize {
    100
}

//==================================================================================
// II. Loading & Resolution
//==================================================================================

impl SfhConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SfhError> {
        let config: SfhConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SfhError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Builds a configuration from the process environment.
    pub fn from_env() -> Result<Self, SfhError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// `SFH_CONFIG` (a JSON file) is read first; `SFH_LIBRARY` and `SYS`
    /// override the corresponding fields.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SfhError> {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        if let Some(path) = lookup(LIBRARY_ENV).filter(|p| !p.is_empty()) {
            config.library_path = Some(PathBuf::from(path));
        }
        if let Some(site) = lookup(SITE_ENV).filter(|s| !s.is_empty()) {
            config.site = Some(site);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants `sfhlonam_` and path resolution rely on.
    pub fn validate(&self) -> Result<(), SfhError> {
        if self.object_list_capacity == 0 || self.object_list_capacity > i16::MAX as usize {
            return Err(SfhError::Config(format!(
                "object_list_capacity must be within 1..={}, got {}",
                i16::MAX,
                self.object_list_capacity
            )));
        }
        if self.library_path.is_none() && !self.install_template.contains(SITE_PLACEHOLDER) {
            return Err(SfhError::Config(format!(
                "install_template '{}' lacks the {} placeholder",
                self.install_template, SITE_PLACEHOLDER
            )));
        }
        Ok(())
    }

    /// The shared library to load: the explicit path, else the site template.
    pub fn resolve_library_path(&self) -> Result<PathBuf, SfhError> {
        if let Some(path) = &self.library_path {
            return Ok(path.clone());
        }
        match &self.site {
            Some(site) => Ok(PathBuf::from(
                self.install_template.replace(SITE_PLACEHOLDER, site),
            )),
            None => Err(SfhError::Config(format!(
                "no library path configured; set {} or {}",
                LIBRARY_ENV, SITE_ENV
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_site_expands_install_template() {
        let config = SfhConfig::from_vars(vars(&[("SYS", "amd64_sles15")])).unwrap();
        assert_eq!(
            config.resolve_library_path().unwrap(),
            PathBuf::from("/afs/ipp-garching.mpg.de/aug/ads/amd64_sles15/lib64/libsfh8.so")
        );
    }

    #[test]
    fn test_explicit_library_wins_over_site() {
        let config = SfhConfig::from_vars(vars(&[
            ("SYS", "amd64_sles15"),
            ("SFH_LIBRARY", "/opt/sfh/libsfh8.so"),
        ]))
        .unwrap();
        assert_eq!(
            config.resolve_library_path().unwrap(),
            PathBuf::from("/opt/sfh/libsfh8.so")
        );
    }

    #[test]
    fn test_unresolvable_without_site_or_path() {
        let config = SfhConfig::from_vars(vars(&[])).unwrap();
        let err = config.resolve_library_path().unwrap_err();
        assert!(err.to_string().contains("SFH_LIBRARY"));
    }

    #[test]
    fn test_json_defaults_and_overrides() {
        let config = SfhConfig::from_json_str(r#"{ "site": "x86_64" }"#).unwrap();
        assert_eq!(config.object_list_capacity, 100);
        assert_eq!(config.site.as_deref(), Some("x86_64"));

        let config = SfhConfig::from_json_str(
            r#"{ "library_path": "/tmp/libsfh8.so", "object_list_capacity": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.object_list_capacity, 250);
    }

    #[test]
    fn test_capacity_bounds_are_validated() {
        let err = SfhConfig::from_json_str(r#"{ "object_list_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, SfhError::Config(_)));
        let err = SfhConfig::from_json_str(r#"{ "object_list_capacity": 40000 }"#).unwrap_err();
        assert!(matches!(err, SfhError::Config(_)));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let err =
            SfhConfig::from_json_str(r#"{ "install_template": "/usr/lib/libsfh8.so" }"#)
                .unwrap_err();
        assert!(err.to_string().contains("{site}"));
    }

    #[test]
    fn test_malformed_json_is_a_serde_error() {
        let err = SfhConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SfhError::SerdeJson(_)));
    }
}
