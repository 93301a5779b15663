//! Values documents with deep merge support
//!
//! A pack's `values.yaml`, extra `-f` files and `--set` overrides are merged
//! here as untyped documents before being decoded into [`ChartValues`].
//!
//! [`ChartValues`]: crate::config::ChartValues

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Values container with deep merge capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        // An empty file decodes to null
        if value.is_null() {
            return Ok(Self::new());
        }
        Ok(Self(value))
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g., "global.image.tag")
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(CoreError::ValuesMerge {
                message: format!("Invalid key path: '{}'", path),
            });
        }
        set_nested(&mut self.0, &parts, value);
        Ok(())
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Decode the merged document into a typed configuration struct
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.0.clone()).map_err(|e| CoreError::InvalidValues {
            message: e.to_string(),
        })
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path, creating intermediate objects
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    if let JsonValue::Object(map) = value {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        set_nested(entry, remaining, new_value);
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        JsonValue::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

/// Parse --set arguments (key=value format)
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for arg in set_args {
        let (key, val) = arg.split_once('=').ok_or_else(|| CoreError::ValuesMerge {
            message: format!("Invalid --set format: '{}'. Expected key=value", arg),
        })?;

        // Try to parse as JSON, fallback to string
        let json_value = if val == "true" {
            JsonValue::Bool(true)
        } else if val == "false" {
            JsonValue::Bool(false)
        } else if val == "null" {
            JsonValue::Null
        } else if let Ok(num) = val.parse::<i64>() {
            JsonValue::Number(num.into())
        } else if val.starts_with('[') || val.starts_with('{') {
            serde_json::from_str(val).unwrap_or(JsonValue::String(val.to_string()))
        } else {
            JsonValue::String(val.to_string())
        };

        values.set(key, json_value)?;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
global:
  namespace: shop
  image:
    registry: registry.example.com
    tag: "1.0"
apps:
  - name: api
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
global:
  image:
    tag: "2.0"
  activeColor: green
apps:
  - name: worker
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("global.namespace").unwrap(), "shop");
        assert_eq!(base.get("global.image.registry").unwrap(), "registry.example.com");
        assert_eq!(base.get("global.image.tag").unwrap(), "2.0");
        assert_eq!(base.get("global.activeColor").unwrap(), "green");
        // Arrays are replaced, not appended
        assert_eq!(base.get("apps.0.name").unwrap(), "worker");
        assert!(base.get("apps.1").is_none());
    }

    #[test]
    fn test_set_nested() {
        let mut values = Values::new();
        values
            .set("global.image.tag", JsonValue::String("v1".into()))
            .unwrap();
        values
            .set("global.replicas", JsonValue::Number(3.into()))
            .unwrap();

        assert_eq!(values.get("global.image.tag").unwrap(), "v1");
        assert_eq!(values.get("global.replicas").unwrap(), 3);
    }

    #[test]
    fn test_set_rejects_empty_segment() {
        let mut values = Values::new();
        assert!(values.set("global..tag", JsonValue::Null).is_err());
    }

    #[test]
    fn test_parse_set_values() {
        let args = vec![
            "global.activeColor=green".to_string(),
            "global.replicas=5".to_string(),
            "ingress.enabled=false".to_string(),
            "global.imagePullSecrets=[\"regcred\"]".to_string(),
        ];

        let values = parse_set_values(&args).unwrap();

        assert_eq!(values.get("global.activeColor").unwrap(), "green");
        assert_eq!(values.get("global.replicas").unwrap(), 5);
        assert_eq!(values.get("ingress.enabled").unwrap(), false);
        assert_eq!(values.get("global.imagePullSecrets.0").unwrap(), "regcred");
    }

    #[test]
    fn test_parse_set_values_invalid() {
        let args = vec!["global.activeColor".to_string()];
        assert!(parse_set_values(&args).is_err());
    }

    #[test]
    fn test_null_document_is_empty_values() {
        let values = Values::from_yaml("~").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_decode_reports_invalid_values() {
        #[derive(Debug, Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            replicas: i32,
        }

        let values = Values::from_yaml("replicas: many").unwrap();
        let err = values.decode::<Shape>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidValues { .. }));
    }
}
