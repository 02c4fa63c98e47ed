//! LLM provider implementations

pub mod gemini;
pub mod openai;

use log::{error, trace};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::GatewayError;

/// Decoded upstream reply
#[derive(Debug, Clone)]
pub(crate) struct UpstreamReply
{   pub status: u16
  , pub ok: bool
  , pub body: Value
}

/// Read status and body. An undecodable body reads as `{}`.
pub(crate) async fn read_reply(
  response: reqwest::Response
) -> Result<UpstreamReply, reqwest::Error>
{   let status = response.status();
    trace!("Upstream response status: {}", status);
    let bytes = response.bytes().await?;
    let body = serde_json::from_slice(&bytes)
      .unwrap_or_else(|_| Value::Object(Default::default()));
    Ok(UpstreamReply
    {   status: status.as_u16()
      , ok: status.is_success()
      , body
    })
}

/// `error.message` from an upstream error body, or a generic message
pub(crate) fn error_message(body: &Value, config: &ProviderConfig) -> String
{   body.pointer("/error/message")
      .and_then(Value::as_str)
      .filter(|message| !message.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| request_failed(config))
}

pub(crate) fn request_failed(config: &ProviderConfig) -> String
{   format!("{} request failed.", config.name)
}

/// Failure used when no candidate was ever attempted
pub(crate) fn exhausted(config: &ProviderConfig) -> GatewayError
{   GatewayError::UpstreamRequest
    {   status: 500
      , message: request_failed(config)
    }
}

/// Transport failure. The URL is stripped before logging: Gemini carries
/// its key in the query string.
pub(crate) fn unreachable(
  config: &ProviderConfig
, err: reqwest::Error
) -> GatewayError
{   error!("HTTP error reaching {}: {}", config.name, err.without_url());
    GatewayError::UpstreamUnreachable(
      format!("Failed to reach {} API.", config.name)
    )
}

pub(crate) fn empty_response(config: &ProviderConfig) -> GatewayError
{   error!("{} returned no usable text", config.name);
    GatewayError::UpstreamEmpty(
      format!("{} returned an empty response.", config.name)
    )
}
