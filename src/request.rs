//! Unified request and result types for the gateway

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

pub const MISSING_PROMPT: &str = "Missing required field: prompt.";

/// Normalized generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest
{   /// Trimmed, never empty
    pub prompt: String
  , /// Trimmed, `None` when blank
    pub system_instruction: Option<String>
  , /// Ask for structured JSON output
    pub is_json: bool
}

impl GenerationRequest
{   /// Build a request for a plain prompt
    pub fn new(prompt: impl Into<String>) -> Self
    {   GenerationRequest
        {   prompt: prompt.into()
          , system_instruction: None
          , is_json: false
        }
    }

    /// Normalize a decoded JSON body.
    /// Non-string fields are treated as absent.
    pub fn from_json(body: &Value) -> Result<Self, GatewayError>
    {   let prompt = trimmed_string(body.get("prompt"))
          .ok_or_else(|| {
            GatewayError::Validation(MISSING_PROMPT.to_string())
          })?;

        Ok(GenerationRequest
        {   prompt
          , system_instruction: trimmed_string(
              body.get("systemInstruction")
            )
          , is_json: body.get("isJson").map(truthy).unwrap_or(false)
        })
    }
}

fn trimmed_string(value: Option<&Value>) -> Option<String>
{   value
      .and_then(Value::as_str)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
}

fn truthy(value: &Value) -> bool
{   match value
    {   Value::Null => false
      , Value::Bool(b) => *b
      , Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true)
      , Value::String(s) => !s.is_empty()
      , Value::Array(_) | Value::Object(_) => true
    }
}

/// Normalized outcome, exactly one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GenerationResult
{   Success
    {   text: String
    }
  , Failure
    {   error: String
      , #[serde(skip)]
        status_code: u16
    }
}

impl GenerationResult
{   /// HTTP status for this result
    pub fn status_code(&self) -> u16
    {   match self
        {   GenerationResult::Success { .. } => 200
          , GenerationResult::Failure { status_code, .. } => *status_code
        }
    }

    /// Response body as JSON
    pub fn to_json(&self) -> Value
    {   serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<GatewayError> for GenerationResult
{   fn from(e: GatewayError) -> Self
    {   let e = e.surfaced();
        GenerationResult::Failure
        {   status_code: e.status_code()
          , error: e.to_string()
        }
    }
}

impl From<Result<String, GatewayError>> for GenerationResult
{   fn from(result: Result<String, GatewayError>) -> Self
    {   match result
        {   Ok(text) => GenerationResult::Success { text }
          , Err(e) => GenerationResult::from(e)
        }
    }
}
