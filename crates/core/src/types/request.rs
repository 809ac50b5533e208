//! Request descriptors supplied by tool collaborators

use crate::errors::{Error, Result, Validate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Everything the pipeline needs to know about one upstream request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// Logical endpoint name, relative to the API base URL (e.g. `XIT001`)
    pub endpoint: String,
    /// Request parameters; insertion order carries no meaning
    #[serde(default)]
    pub params: HashMap<String, Value>,
    /// Bypass both cache tiers and overwrite whatever they hold for this request
    #[serde(default)]
    pub force_refresh: bool,
}

impl RequestDescriptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: HashMap::new(),
            force_refresh: false,
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a parameter only when a value is present
    #[must_use]
    pub fn param_opt<V: Into<Value>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    #[must_use]
    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Check the descriptor before it reaches the orchestrator
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)?;
        for (name, value) in &self.params {
            Validate::not_blank(name, "params")?;
            ensure_no_nulls(name, value)?;
        }
        Ok(())
    }

    /// Flatten the parameters into sorted query pairs.
    ///
    /// Scalars are stringified and arrays of scalars become repeated pairs.
    /// Objects and nested arrays have no query-string form and are rejected.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>> {
        let mut names: Vec<&String> = self.params.keys().collect();
        names.sort();

        let mut pairs = Vec::with_capacity(names.len());
        for name in names {
            match &self.params[name] {
                Value::Array(items) => {
                    for item in items {
                        let text = scalar_to_string(item).ok_or_else(|| {
                            Error::invalid_parameter(
                                name.as_str(),
                                "nested values cannot be encoded as query parameters",
                            )
                        })?;
                        pairs.push((name.clone(), text));
                    }
                }
                value => {
                    let text = scalar_to_string(value).ok_or_else(|| {
                        Error::invalid_parameter(
                            name.as_str(),
                            "objects cannot be encoded as query parameters",
                        )
                    })?;
                    pairs.push((name.clone(), text));
                }
            }
        }
        Ok(pairs)
    }
}

/// Endpoints are relative paths under the API base URL.
///
/// A scheme, query or fragment would let `Url::join` escape the base, so `:`, `?`
/// and `#` are rejected along with leading slashes, whitespace and `..` segments.
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    Validate::not_blank(endpoint, "endpoint")?;
    if endpoint.starts_with('/') || endpoint.starts_with('\\') {
        return Err(Error::invalid_parameter(
            "endpoint",
            format!("'{endpoint}' must be relative to the API base URL"),
        ));
    }
    if let Some(c) = endpoint.chars().find(|c| matches!(c, ':' | '?' | '#' | '\\')) {
        return Err(Error::invalid_parameter(
            "endpoint",
            format!("'{endpoint}' must be a plain path; '{c}' is not allowed"),
        ));
    }
    if endpoint.chars().any(char::is_whitespace) {
        return Err(Error::invalid_parameter(
            "endpoint",
            format!("'{endpoint}' must not contain whitespace"),
        ));
    }
    if endpoint.split('/').any(|segment| segment == "..") {
        return Err(Error::invalid_parameter(
            "endpoint",
            format!("'{endpoint}' must not contain '..' segments"),
        ));
    }
    Ok(())
}

/// Reject `null` anywhere inside a parameter value
pub fn ensure_no_nulls(name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => Err(Error::invalid_parameter(
            name,
            "null is not a valid parameter value; omit the parameter instead",
        )),
        Value::Array(items) => items.iter().try_for_each(|item| ensure_no_nulls(name, item)),
        Value::Object(map) => map.values().try_for_each(|item| ensure_no_nulls(name, item)),
        _ => Ok(()),
    }
}

/// String form of a JSON scalar; `None` for arrays, objects and null
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_validation() {
        let descriptor = RequestDescriptor::new("XIT001")
            .param("year", 2024)
            .param("area", "13")
            .param_opt("city", None::<String>)
            .force_refresh(true);

        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.params.len(), 2);
        assert!(descriptor.force_refresh);
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(validate_endpoint("XIT001").is_ok());
        assert!(validate_endpoint("XKT006/tiles").is_ok());
        assert!(validate_endpoint("").is_err());
        assert!(validate_endpoint("/XIT001").is_err());
        assert!(validate_endpoint("XIT 001").is_err());
        assert!(validate_endpoint("../secret").is_err());
    }

    #[test]
    fn test_endpoint_cannot_name_another_host() {
        for endpoint in [
            "http://other-host/grab",
            "https://other-host",
            "//other-host/grab",
            "\\\\other-host\\grab",
            "mailto:someone",
            "XIT001?year=2024",
            "XIT001#fragment",
        ] {
            match validate_endpoint(endpoint) {
                Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "endpoint"),
                other => panic!("expected '{endpoint}' to be rejected, got {other:?}"),
            }
        }
        assert!(RequestDescriptor::new("http://other-host/grab").validate().is_err());
    }

    #[test]
    fn test_null_parameters_are_rejected() {
        let descriptor = RequestDescriptor::new("XIT001").param("area", Value::Null);
        match descriptor.validate() {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "area"),
            other => panic!("expected invalid parameter, got {other:?}"),
        }

        let nested = RequestDescriptor::new("XIT001").param("filter", json!({"a": [1, null]}));
        assert!(nested.validate().is_err());
    }

    #[test]
    fn test_blank_parameter_name_is_rejected() {
        let descriptor = RequestDescriptor::new("XIT001").param(" ", "13");
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_query_pairs_are_sorted_and_flattened() {
        let descriptor = RequestDescriptor::new("XIT001")
            .param("year", 2024)
            .param("area", "13")
            .param("quarter", json!([1, 2]))
            .param("priceClassification", true);

        let pairs = descriptor.query_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("area".to_string(), "13".to_string()),
                ("priceClassification".to_string(), "true".to_string()),
                ("quarter".to_string(), "1".to_string()),
                ("quarter".to_string(), "2".to_string()),
                ("year".to_string(), "2024".to_string()),
            ]
        );
    }

    #[test]
    fn test_objects_cannot_become_query_pairs() {
        let descriptor = RequestDescriptor::new("XIT001").param("bbox", json!({"x": 1}));
        assert!(matches!(
            descriptor.query_pairs(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_descriptor_deserializes_from_camel_case() {
        let descriptor: RequestDescriptor = serde_json::from_value(json!({
            "endpoint": "XIT002",
            "params": {"area": "13"},
            "forceRefresh": true
        }))
        .unwrap();
        assert_eq!(descriptor.endpoint, "XIT002");
        assert!(descriptor.force_refresh);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_query_pairs_are_sorted_for_any_scalars(
                params in prop::collection::hash_map("[a-zA-Z]{1,8}", any::<i32>(), 0..10)
            ) {
                let mut descriptor = RequestDescriptor::new("XIT001");
                for (name, value) in &params {
                    descriptor = descriptor.param(name.clone(), *value);
                }

                let pairs = descriptor.query_pairs().unwrap();
                prop_assert_eq!(pairs.len(), params.len());
                prop_assert!(pairs.windows(2).all(|w| w[0].0 <= w[1].0));
                for (name, value) in pairs {
                    prop_assert_eq!(value, params[&name].to_string());
                }
            }
        }
    }
}
