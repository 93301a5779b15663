//! Blue/green color routing
//!
//! A [`Color`] is an opaque label value; `blue` and `green` are only the
//! conventional pair. The [`ColorRouter`] decides which color is active and
//! turns it into the selector fragment a Service uses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::naming::is_label_value;

/// Color used when no layer sets one
pub const DEFAULT_COLOR: &str = "blue";

/// Label key carrying the color when the pack does not configure one
pub const DEFAULT_COLOR_LABEL: &str = "color";

/// A validated color label value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Validate and wrap a color value; it must be a label value
    pub fn parse(value: &str) -> Option<Self> {
        is_label_value(value).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single `key: value` selector entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorFragment {
    pub key: String,
    pub value: String,
}

/// Decides the active color and renders it as a label selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRouter {
    label_key: String,
}

impl Default for ColorRouter {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR_LABEL)
    }
}

impl ColorRouter {
    pub fn new(label_key: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
        }
    }

    /// Label key the color is stored under
    pub fn label_key(&self) -> &str {
        &self.label_key
    }

    /// The per-application override wins, then the global default, then `blue`
    pub fn resolve(&self, app_override: Option<&Color>, global_default: Option<&Color>) -> Color {
        app_override
            .or(global_default)
            .cloned()
            .unwrap_or_default()
    }

    /// Selector entry routing traffic to `color`
    pub fn selector(&self, color: &Color) -> SelectorFragment {
        SelectorFragment {
            key: self.label_key.clone(),
            value: color.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(s: &str) -> Color {
        Color::parse(s).unwrap()
    }

    #[test]
    fn test_parse_color() {
        assert!(Color::parse("blue").is_some());
        assert!(Color::parse("canary-2").is_some());
        assert!(Color::parse("").is_none());
        assert!(Color::parse("-green").is_none());
        assert!(Color::parse("green shade").is_none());
        assert!(Color::parse(&"a".repeat(64)).is_none());
    }

    #[test]
    fn test_resolve_default_is_blue() {
        let router = ColorRouter::default();
        assert_eq!(router.resolve(None, None).as_str(), "blue");
    }

    #[test]
    fn test_resolve_precedence() {
        let router = ColorRouter::default();
        let green = color("green");
        let blue = color("blue");

        assert_eq!(router.resolve(None, Some(&green)), green);
        assert_eq!(router.resolve(Some(&blue), Some(&green)), blue);
    }

    #[test]
    fn test_selector_uses_configured_key() {
        let router = ColorRouter::new("track");
        let fragment = router.selector(&color("green"));
        assert_eq!(fragment.key, "track");
        assert_eq!(fragment.value, "green");

        assert_eq!(ColorRouter::default().selector(&color("blue")).key, "color");
    }
}
