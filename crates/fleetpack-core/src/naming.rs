//! Object names and the canonical label set
//!
//! Every name is a DNS label: lowercase alphanumerics and `-`, at most 63
//! characters, no separator at either end. Generation is pure; the same
//! chart and release identity always produce the same names and labels.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// DNS-1123 label length ceiling
pub const MAX_NAME_LEN: usize = 63;

/// Default value of the managed-by label
pub const DEFAULT_MANAGED_BY: &str = "fleetpack";

pub const LABEL_CHART: &str = "fleetpack.io/chart";
pub const LABEL_INSTANCE: &str = "app.kubernetes.io/instance";
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_ACTIVE_COLOR: &str = "fleetpack.io/active-color";

/// Workload label shared by a Deployment's pods and its Service selector
pub const LABEL_APP: &str = "app";

static INVALID_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]+").expect("valid regex"));

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("valid regex"));

static LABEL_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9_.-]{0,61}[A-Za-z0-9])?$").expect("valid regex")
});

/// RFC 1123 label, as required for namespaces and application names
pub fn is_dns_label(value: &str) -> bool {
    DNS_LABEL.is_match(value)
}

/// Valid Kubernetes label value (non-empty)
pub fn is_label_value(value: &str) -> bool {
    LABEL_VALUE.is_match(value)
}

/// Make an arbitrary string DNS-label safe
///
/// Lowercases, replaces runs of invalid characters with `-`, strips leading
/// separators, truncates to 63 characters and strips trailing separators.
pub fn sanitize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let replaced = INVALID_CHARS.replace_all(&lowered, "-");
    let truncated: String = replaced
        .trim_start_matches('-')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();
    truncated.trim_end_matches('-').to_string()
}

/// Helm's `trunc 63 | trimSuffix "-"` for label values
///
/// A label value must end with an alphanumeric, so any trailing `-`, `_`
/// or `.` left by the cut is dropped as well.
pub fn truncate_label_value(raw: &str) -> String {
    let truncated: String = raw.chars().take(MAX_NAME_LEN).collect();
    truncated
        .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// Generates names and labels for one release of one chart
#[derive(Debug, Clone)]
pub struct NameGenerator {
    chart_name: String,
    chart_version: String,
    release_name: String,
    managed_by: String,
    name_override: Option<String>,
    fullname_override: Option<String>,
}

impl NameGenerator {
    pub fn new(
        chart_name: impl Into<String>,
        chart_version: impl Into<String>,
        release_name: impl Into<String>,
    ) -> Self {
        Self {
            chart_name: chart_name.into(),
            chart_version: chart_version.into(),
            release_name: release_name.into(),
            managed_by: DEFAULT_MANAGED_BY.to_string(),
            name_override: None,
            fullname_override: None,
        }
    }

    /// Set the managed-by marker
    pub fn managed_by(mut self, marker: impl Into<String>) -> Self {
        self.managed_by = marker.into();
        self
    }

    /// Replace the chart name in generated names
    pub fn name_override(mut self, name: Option<String>) -> Self {
        self.name_override = name.filter(|n| !n.is_empty());
        self
    }

    /// Replace the whole base name
    pub fn fullname_override(mut self, name: Option<String>) -> Self {
        self.fullname_override = name.filter(|n| !n.is_empty());
        self
    }

    /// Chart name, or its override
    pub fn name(&self) -> String {
        sanitize(self.name_override.as_deref().unwrap_or(&self.chart_name))
    }

    /// Base name for release-wide objects
    ///
    /// `fullnameOverride` wins; a release name already containing the chart
    /// name is used alone, otherwise `<release>-<chart>`.
    pub fn fullname(&self) -> String {
        if let Some(full) = &self.fullname_override {
            return sanitize(full);
        }

        let name = self.name_override.as_deref().unwrap_or(&self.chart_name);
        if self.release_name.contains(name) {
            sanitize(&self.release_name)
        } else {
            sanitize(&format!("{}-{}", self.release_name, name))
        }
    }

    /// Name for an object derived from the base name: `<fullname>-<suffix>`
    pub fn object_name(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            return self.fullname();
        }
        sanitize(&format!("{}-{}", self.fullname(), suffix))
    }

    /// `<name>-<version>` with `+` made label safe, cut to a label value
    pub fn chart_label(&self) -> String {
        truncate_label_value(&format!("{}-{}", self.chart_name, self.chart_version).replace('+', "_"))
    }

    /// Whether the release name can be carried by the instance label
    pub fn release_is_label_value(&self) -> bool {
        is_label_value(&self.release_name)
    }

    /// Labels carried by every produced object
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_CHART.to_string(), self.chart_label()),
            (LABEL_INSTANCE.to_string(), self.release_name.clone()),
            (LABEL_MANAGED_BY.to_string(), self.managed_by.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("My_App"), "my-app");
        assert_eq!(sanitize("--api--"), "api");
        assert_eq!(sanitize("shop.v2 api"), "shop-v2-api");
    }

    #[test]
    fn test_sanitize_keeps_full_length_after_leading_separators() {
        let raw = format!("--{}", "a".repeat(70));
        assert_eq!(sanitize(&raw), "a".repeat(MAX_NAME_LEN));
    }

    #[test]
    fn test_truncate_label_value() {
        assert_eq!(truncate_label_value("shop-1.0.0"), "shop-1.0.0");
        let cut = truncate_label_value(&format!("{}-1.0.0", "c".repeat(62)));
        assert_eq!(cut, "c".repeat(62));
        let cut = truncate_label_value(&format!("{}_.x", "c".repeat(61)));
        assert_eq!(cut, "c".repeat(61));
    }

    #[test]
    fn test_label_checks() {
        assert!(is_dns_label("shop-prod"));
        assert!(!is_dns_label("Shop"));
        assert!(!is_dns_label("api-"));
        assert!(is_label_value("Blue_1.0"));
        assert!(!is_label_value(""));
    }

    #[test]
    fn test_fullname_combines_release_and_chart() {
        let names = NameGenerator::new("shop", "1.0.0", "prod");
        assert_eq!(names.fullname(), "prod-shop");
        assert_eq!(names.object_name("api"), "prod-shop-api");
    }

    #[test]
    fn test_fullname_release_contains_chart() {
        let names = NameGenerator::new("shop", "1.0.0", "shop-prod");
        assert_eq!(names.fullname(), "shop-prod");
    }

    #[test]
    fn test_fullname_overrides() {
        let names = NameGenerator::new("shop", "1.0.0", "prod")
            .name_override(Some("store".to_string()));
        assert_eq!(names.fullname(), "prod-store");
        assert_eq!(names.name(), "store");

        let names = names.fullname_override(Some("storefront".to_string()));
        assert_eq!(names.fullname(), "storefront");

        // Empty overrides are ignored
        let names = NameGenerator::new("shop", "1.0.0", "prod").fullname_override(Some(String::new()));
        assert_eq!(names.fullname(), "prod-shop");
    }

    #[test]
    fn test_long_name_truncated_to_63() {
        let release = "r".repeat(50);
        let names = NameGenerator::new("chart-with-a-long-name", "1.0.0", release);
        let full = names.fullname();
        assert_eq!(full.len(), MAX_NAME_LEN);
        assert!(!full.ends_with('-'));
        assert!(full.starts_with(&"r".repeat(50)));
    }

    #[test]
    fn test_truncation_strips_trailing_separator() {
        // 62 characters then the separator falls on position 63
        let release = "a".repeat(62);
        let names = NameGenerator::new("shop", "1.0.0", release.clone());
        let full = names.fullname();
        assert_eq!(full, release);
        assert!(!full.ends_with('-'));
    }

    #[test]
    fn test_labels() {
        let names = NameGenerator::new("shop", "1.0.0+build.7", "prod").managed_by("ci");
        let labels = names.labels();
        assert_eq!(labels[LABEL_CHART], "shop-1.0.0_build.7");
        assert_eq!(labels[LABEL_INSTANCE], "prod");
        assert_eq!(labels[LABEL_MANAGED_BY], "ci");
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn test_long_chart_label_is_valid() {
        let names = NameGenerator::new("c".repeat(70), "1.0.0", "prod");
        let label = names.chart_label();
        assert_eq!(label.len(), MAX_NAME_LEN);
        assert!(is_label_value(&label));
    }

    #[test]
    fn test_release_label_value_check() {
        assert!(NameGenerator::new("shop", "1.0.0", "prod").release_is_label_value());
        assert!(!NameGenerator::new("shop", "1.0.0", "my release!").release_is_label_value());
        assert!(!NameGenerator::new("shop", "1.0.0", "r".repeat(64)).release_is_label_value());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = NameGenerator::new("shop", "1.0.0", "prod");
        let b = NameGenerator::new("shop", "1.0.0", "prod");
        assert_eq!(a.object_name("api"), b.object_name("api"));
        assert_eq!(a.labels(), b.labels());
    }
}
