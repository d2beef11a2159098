//! Deserializers for numeric fields the server sometimes sends as strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Some(v.min(u32::MAX as u64) as u32)
            } else if let Some(v) = n.as_i64() {
                // negative counts collapse to zero
                Some(if v < 0 { 0 } else { v as u32 })
            } else {
                n.as_f64().map(|f| if f <= 0.0 { 0 } else { f as u32 })
            }
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Number, numeric string, null or garbage. Anything unreadable becomes 0.
pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(to_u32).unwrap_or(0))
}

/// Like [`u32_or_zero`] but keeps absence distinct.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(to_u32))
}
