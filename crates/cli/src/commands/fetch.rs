use mlit_core::{RequestDescriptor, Result, Validate};
use mlit_fetch::FetchService;
use serde_json::Value;

/// Parse `key=value`; the value is read as JSON when possible, otherwise kept as a string
pub fn parse_param(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter name is empty in '{raw}'"));
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(Value::Null) | Err(_) => Value::String(value.to_string()),
        Ok(parsed) => parsed,
    };
    Ok((key.to_string(), value))
}

pub async fn execute(
    service: &FetchService,
    endpoint: String,
    params: Vec<(String, Value)>,
    category: &str,
    force_refresh: bool,
) -> Result<Value> {
    Validate::slug(category, "category")?;
    let mut descriptor = RequestDescriptor::new(endpoint).force_refresh(force_refresh);
    for (name, value) in params {
        descriptor = descriptor.param(name, value);
    }

    let result = service.fetch(&descriptor).await?;
    let materialized = service.materialize(&result.payload, category).await?;

    let mut output = serde_json::to_value(&materialized)?;
    if let Value::Object(map) = &mut output {
        map.insert("fromCache".to_string(), Value::Bool(result.from_cache));
    }
    Ok(output)
}
