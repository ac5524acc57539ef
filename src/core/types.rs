use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// How numeric JSON fields in responses are materialized
///
/// Prices and sizes lose precision when routed through `f64`. `Decimal` keeps
/// every numeric literal exactly as the exchange sent it, so it can later be
/// converted with [`to_decimal`] without rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericPolicy {
    /// Fractional numbers are parsed as native `f64`
    #[default]
    Float,
    /// Numbers keep their exact decimal text
    Decimal,
}

impl NumericPolicy {
    /// Parse a response body according to this policy
    pub fn parse(self, text: &str) -> Result<Value, serde_json::Error> {
        let mut value: Value = serde_json::from_str(text)?;
        if self == Self::Float {
            round_floats(&mut value);
        }
        Ok(value)
    }
}

impl fmt::Display for NumericPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Decimal => write!(f, "decimal"),
        }
    }
}

impl FromStr for NumericPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" => Ok(Self::Float),
            "decimal" => Ok(Self::Decimal),
            other => Err(format!("unknown numeric policy '{}'", other)),
        }
    }
}

fn round_floats(value: &mut Value) {
    match value {
        Value::Number(number) => {
            let literal = number.to_string();
            if literal.contains(['.', 'e', 'E']) {
                if let Some(rounded) = number.as_f64().and_then(Number::from_f64) {
                    *number = rounded;
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(round_floats),
        Value::Object(map) => map.values_mut().for_each(round_floats),
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}

/// Convert a JSON number (or numeric string) into a `Decimal`
///
/// Exact when the response was parsed with [`NumericPolicy::Decimal`].
pub fn to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
