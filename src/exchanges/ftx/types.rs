use serde_json::Value;

/// Fallback message when a failed envelope carries no `error` text
pub const UNKNOWN_ERROR: &str = "unknown error";

/// The exchange's uniform response wrapper
///
/// `{"success": true, "result": ...}` or `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Failure(String),
}

impl Envelope {
    /// Interpret a parsed response body
    ///
    /// Anything other than `success: true` is a failure, including a missing or
    /// non-boolean `success` field. A body that is not an object, or a success
    /// without `result`, has no envelope at all and yields `Err`.
    pub fn from_value(body: Value) -> Result<Self, &'static str> {
        let Value::Object(mut map) = body else {
            return Err("response is not a JSON object");
        };

        if map.get("success") == Some(&Value::Bool(true)) {
            return map
                .remove("result")
                .map(Self::Success)
                .ok_or("successful response has no result");
        }

        let message = match map.remove("error") {
            Some(Value::String(message)) => message,
            Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
            Some(other) => other.to_string(),
        };
        Ok(Self::Failure(message))
    }
}
