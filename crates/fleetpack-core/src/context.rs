//! Render context
//!
//! Everything one render consumes: declared configuration, the selected
//! environment overlay, and the release and pack identity used for naming.

use serde::{Deserialize, Serialize};

use crate::config::{ChartValues, EnvironmentOverlay};
use crate::pack::PackMetadata;

/// Release identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    /// Release name
    pub name: String,

    /// Namespace used when no layer sets one
    pub namespace: String,
}

impl ReleaseInfo {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

/// Pack identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackInfo {
    /// Pack name
    pub name: String,

    /// Pack version
    pub version: String,

    /// App version
    pub app_version: Option<String>,
}

impl From<&PackMetadata> for PackInfo {
    fn from(meta: &PackMetadata) -> Self {
        Self {
            name: meta.name.clone(),
            version: meta.version.to_string(),
            app_version: meta.app_version.clone(),
        }
    }
}

/// Input of a single render
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub values: ChartValues,

    /// Selected overlay, if any
    pub environment: Option<EnvironmentOverlay>,

    /// Name of the selected overlay, for diagnostics
    pub environment_name: Option<String>,

    pub release: ReleaseInfo,

    pub pack: PackInfo,
}

impl RenderContext {
    /// Create a render context without an environment overlay
    pub fn new(values: ChartValues, release: ReleaseInfo, pack: &PackMetadata) -> Self {
        Self {
            values,
            environment: None,
            environment_name: None,
            release,
            pack: PackInfo::from(pack),
        }
    }

    /// Select an environment overlay
    pub fn with_environment(mut self, name: &str, overlay: EnvironmentOverlay) -> Self {
        self.environment = Some(overlay);
        self.environment_name = Some(name.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn test_render_context() {
        let values = ChartValues::from_yaml("apps: []").unwrap();
        let release = ReleaseInfo::new("prod", "shop");
        let pack = PackMetadata {
            name: "shop".to_string(),
            version: Version::new(1, 0, 0),
            description: None,
            app_version: Some("2.0.0".to_string()),
        };

        let ctx = RenderContext::new(values, release, &pack);
        assert_eq!(ctx.pack.name, "shop");
        assert_eq!(ctx.pack.version, "1.0.0");
        assert_eq!(ctx.release.namespace, "shop");
        assert!(ctx.environment.is_none());

        let ctx = ctx.with_environment("prod", EnvironmentOverlay::default());
        assert_eq!(ctx.environment_name.as_deref(), Some("prod"));
        assert!(ctx.environment.is_some());
    }
}
