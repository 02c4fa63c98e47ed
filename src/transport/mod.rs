//! Hosting transports.
//!
//! The gateway only sees a [`ShimRequest`] and something implementing
//! [`ResponseSink`]. Each transport supplies its own sink:
//!
//! * [`serverless`]: one event in, one [`serverless::ServerlessReply`] out
//! * [`server`]: a long-running axum server on a TCP socket

pub mod serverless;
pub mod server;

use std::collections::HashMap;
use serde_json::Value;

use crate::error::GatewayError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const INVALID_JSON: &str = "Request body must be valid JSON.";

/// Request body as the transport delivered it
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody
{   /// Already decoded JSON
    Parsed(Value)
  , /// Undecoded text
    Raw(String)
}

impl RequestBody
{   /// Decode raw text, pass parsed values through
    pub fn into_json(self) -> Result<Value, GatewayError>
    {   match self
        {   RequestBody::Parsed(value) => Ok(value)
          , RequestBody::Raw(text) => serde_json::from_str(&text)
              .map_err(|_| GatewayError::Validation(INVALID_JSON.to_string()))
        }
    }
}

/// Transport-neutral inbound request
#[derive(Debug, Clone, PartialEq)]
pub struct ShimRequest
{   pub method: String
  , /// Lowercased header names
    pub headers: HashMap<String, String>
  , pub body: RequestBody
}

impl ShimRequest
{   /// A POST with an already decoded body
    pub fn post(body: Value) -> Self
    {   ShimRequest
        {   method: "POST".to_string()
          , headers: HashMap::new()
          , body: RequestBody::Parsed(body)
        }
    }
}

/// Response capabilities shared by every transport.
///
/// `json` finalizes the response. It takes effect once; later calls are
/// ignored.
pub trait ResponseSink
{   fn set_header(&mut self, name: &str, value: &str);

    fn status(&mut self, code: u16) -> &mut Self;

    fn json(&mut self, payload: &Value);

    fn is_sent(&self) -> bool;
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(
  payload: &(dyn std::any::Any + Send)
) -> String
{   if let Some(s) = payload.downcast_ref::<&str>()
    {   s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>()
    {   s.clone()
    } else
    {   "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn raw_body_is_decoded()
    {   let body = RequestBody::Raw(r#"{"prompt":"x"}"#.to_string());
        assert_eq!(body.into_json().unwrap(), json!({ "prompt": "x" }));
    }

    #[test]
    fn raw_body_that_is_not_json_is_a_validation_error()
    {   for text in ["{", "", "prompt=x"]
        {   let err = RequestBody::Raw(text.to_string()).into_json().unwrap_err();
            assert_eq!(err, GatewayError::Validation(INVALID_JSON.to_string()));
        }
    }
}
