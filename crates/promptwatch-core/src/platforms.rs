use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, CoreError};

/// How a call site treats a platform code that is not on the whitelist:
/// breakdown-style endpoints reject it, filter parameters fall back to
/// "unfiltered".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPlatform {
    Ignore,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
struct PlatformsFile {
    platforms: Vec<PlatformConfig>,
}

/// The fixed whitelist of supported answer-engine platforms.
#[derive(Debug, Clone)]
pub struct PlatformSet {
    platforms: Vec<PlatformConfig>,
}

impl PlatformSet {
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if codes are empty, duplicated, or
    /// the set does not carry exactly two primary platforms.
    pub fn new(platforms: Vec<PlatformConfig>) -> Result<Self, ConfigError> {
        validate_platforms(&platforms)?;
        Ok(Self { platforms })
    }

    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        self.platforms.iter().map(|p| p.code.clone()).collect()
    }

    /// The two platforms breakdown views show by default.
    #[must_use]
    pub fn primary_codes(&self) -> Vec<String> {
        self.platforms
            .iter()
            .filter(|p| p.primary)
            .map(|p| p.code.clone())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.platforms.iter().any(|p| p.code == code)
    }

    #[must_use]
    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.platforms
            .iter()
            .find(|p| p.code == code)
            .map(|p| p.name.as_str())
    }

    /// Resolve a caller-supplied platform filter value.
    ///
    /// `None`, empty, or `"all"` mean "no platform filter". Out-of-whitelist
    /// codes resolve per `on_unknown`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedPlatform`] for an unknown code under
    /// [`UnknownPlatform::Reject`].
    pub fn resolve(
        &self,
        code: Option<&str>,
        on_unknown: UnknownPlatform,
    ) -> Result<Option<String>, CoreError> {
        let code = match code.map(str::trim) {
            None | Some("" | "all") => return Ok(None),
            Some(c) => c,
        };
        if self.contains(code) {
            return Ok(Some(code.to_string()));
        }
        match on_unknown {
            UnknownPlatform::Ignore => Ok(None),
            UnknownPlatform::Reject => Err(CoreError::UnsupportedPlatform(code.to_string())),
        }
    }
}

/// Load and validate the platform whitelist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_platforms(path: &Path) -> Result<PlatformSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlatformsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: PlatformsFile = serde_yaml::from_str(&content)?;
    PlatformSet::new(file.platforms)
}

fn validate_platforms(platforms: &[PlatformConfig]) -> Result<(), ConfigError> {
    if platforms.is_empty() {
        return Err(ConfigError::Validation(
            "platform whitelist must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for platform in platforms {
        if platform.code.trim().is_empty() {
            return Err(ConfigError::Validation(
                "platform code must be non-empty".to_string(),
            ));
        }
        if platform.code != platform.code.to_lowercase() {
            return Err(ConfigError::Validation(format!(
                "platform code '{}' must be lowercase",
                platform.code
            )));
        }
        if !seen.insert(platform.code.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform code: '{}'",
                platform.code
            )));
        }
    }

    let primary_count = platforms.iter().filter(|p| p.primary).count();
    if primary_count != 2 {
        return Err(ConfigError::Validation(format!(
            "expected exactly 2 primary platforms, found {primary_count}"
        )));
    }

    Ok(())
}
