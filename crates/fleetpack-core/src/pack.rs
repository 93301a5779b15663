//! Pack definition and loading
//!
//! A pack is a directory:
//!
//! ```text
//! shop/
//!   Pack.yaml
//!   values.yaml
//!   environments/
//!     prod.yaml
//!     staging.yaml
//! ```

use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::DEFAULT_COLOR_LABEL;
use crate::config::EnvironmentOverlay;
use crate::error::{CoreError, Result};
use crate::naming::DEFAULT_MANAGED_BY;
use crate::values::Values;

/// Supported `apiVersion` of Pack.yaml
pub const API_VERSION: &str = "fleetpack/v1";

/// Directory holding environment overlays
pub const ENVIRONMENTS_DIR: &str = "environments";

/// A Fleetpack pack definition (`Pack.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    /// API version (fleetpack/v1)
    pub api_version: String,

    /// Pack metadata
    pub metadata: PackMetadata,

    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Pack metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    /// Pack name (required)
    pub name: String,

    /// Pack version (required, SemVer)
    #[serde(with = "version_serde")]
    pub version: Version,

    #[serde(default)]
    pub description: Option<String>,

    /// Application version
    #[serde(default)]
    pub app_version: Option<String>,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Value of the `app.kubernetes.io/managed-by` label
    #[serde(default = "default_managed_by")]
    pub managed_by: String,

    /// Label key carrying the blue/green color
    #[serde(default = "default_color_label")]
    pub color_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            managed_by: default_managed_by(),
            color_label: default_color_label(),
        }
    }
}

fn default_managed_by() -> String {
    DEFAULT_MANAGED_BY.to_string()
}

fn default_color_label() -> String {
    DEFAULT_COLOR_LABEL.to_string()
}

/// Loaded pack with resolved paths
#[derive(Debug, Clone)]
pub struct LoadedPack {
    /// Pack definition
    pub pack: Pack,

    /// Root directory of the pack
    pub root: PathBuf,

    /// Values file path
    pub values_path: PathBuf,

    /// Environment overlays directory (if present)
    pub environments_dir: Option<PathBuf>,
}

impl LoadedPack {
    /// Load a pack from a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.exists() {
            return Err(CoreError::PackNotFound {
                path: root.display().to_string(),
            });
        }

        let pack_file = root.join("Pack.yaml");
        if !pack_file.exists() {
            return Err(CoreError::InvalidPack {
                message: format!("Pack.yaml not found in {}", root.display()),
            });
        }

        let pack_content = std::fs::read_to_string(&pack_file)?;
        let pack: Pack = serde_yaml::from_str(&pack_content)?;

        if pack.api_version != API_VERSION {
            return Err(CoreError::InvalidPack {
                message: format!(
                    "Unsupported API version: {}. Expected: {}",
                    pack.api_version, API_VERSION
                ),
            });
        }

        if pack.metadata.name.is_empty() {
            return Err(CoreError::InvalidPack {
                message: "metadata.name must not be empty".to_string(),
            });
        }

        let values_path = root.join("values.yaml");
        let environments_dir = {
            let dir = root.join(ENVIRONMENTS_DIR);
            dir.is_dir().then_some(dir)
        };

        tracing::debug!(pack = %pack.metadata.name, root = %root.display(), "loaded pack");

        Ok(Self {
            pack,
            root,
            values_path,
            environments_dir,
        })
    }

    /// Load `values.yaml`, or empty values if the pack has none
    pub fn load_values(&self) -> Result<Values> {
        if self.values_path.exists() {
            Values::from_file(&self.values_path)
        } else {
            Ok(Values::new())
        }
    }

    /// Names of the available environment overlays, sorted
    pub fn environments(&self) -> Result<Vec<String>> {
        let Some(dir) = &self.environments_dir else {
            return Ok(Vec::new());
        };

        let mut names = Vec::new();
        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_yaml = path
                .extension()
                .map(|ext| matches!(ext.to_string_lossy().to_lowercase().as_str(), "yaml" | "yml"))
                .unwrap_or(false);
            if let (true, Some(stem)) = (is_yaml, path.file_stem()) {
                names.push(stem.to_string_lossy().to_string());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Path of the overlay for environment `name`
    pub fn environment_path(&self, name: &str) -> Result<PathBuf> {
        let not_found = || -> Result<PathBuf> {
            let available = self.environments()?;
            Err(CoreError::EnvironmentNotFound {
                name: name.to_string(),
                available: if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                },
            })
        };

        let Some(dir) = &self.environments_dir else {
            return not_found();
        };

        ["yaml", "yml"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
            .map_or_else(not_found, Ok)
    }

    /// Load the overlay for environment `name`
    pub fn load_environment(&self, name: &str) -> Result<EnvironmentOverlay> {
        let path = self.environment_path(name)?;
        EnvironmentOverlay::from_file(path)
    }
}

/// Custom serde for semver::Version
mod version_serde {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(version: &Version, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&version.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Version, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}
