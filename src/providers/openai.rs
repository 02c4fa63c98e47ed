use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, error, trace};

use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::failover::{classify_upstream_failure, run_candidates, ModelCandidates};
use crate::request::GenerationRequest;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , #[serde(default)]
    pub content: Option<String>
}

impl ChatMessage
{   fn new(role: &str, content: &str) -> Self
    {   ChatMessage
        {   role: role.to_string()
          , content: Some(content.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat
{   #[serde(rename = "type")]
    pub kind: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>
}

// ===== Normalization =====

/// Build the chat completions payload for one model
pub fn build_payload(
  request: &GenerationRequest
, model: &str
) -> ChatRequest
{   let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system_instruction
    {   messages.push(ChatMessage::new("system", system));
    }
    messages.push(ChatMessage::new("user", &request.prompt));

    ChatRequest
    {   model: model.to_string()
      , messages
      , response_format: request.is_json.then(|| ResponseFormat
        {   kind: "json_object".to_string()
        })
    }
}

/// Content of the first choice, trimmed
pub fn extract_text(body: &Value) -> String
{   body.pointer("/choices/0/message/content")
      .and_then(Value::as_str)
      .unwrap_or("")
      .trim()
      .to_string()
}

// ===== Calls =====

/// Generate text with the configured model.
/// Only one model is configured, so nothing falls back.
pub async fn generate(
  http: &reqwest::Client
, config: &ProviderConfig
, api_key: &str
, request: &GenerationRequest
) -> Result<String, GatewayError>
{   let candidates = ModelCandidates::single(&config.model);
    run_candidates(
      &candidates,
      super::exhausted(config),
      |model| call_model(http, config, api_key, model, request)
    ).await
}

async fn call_model(
  http: &reqwest::Client
, config: &ProviderConfig
, api_key: &str
, model: String
, request: &GenerationRequest
) -> Result<String, GatewayError>
{   debug!("Calling OpenAI model: {}", model);
    let payload = build_payload(request, &model);
    trace!("OpenAI request: {:?}", payload);

    let response = http
      .post(format!("{}/chat/completions", config.api_base))
      .bearer_auth(api_key)
      .json(&payload)
      .send()
      .await
      .map_err(|e| super::unreachable(config, e))?;

    let reply = super::read_reply(response)
      .await
      .map_err(|e| super::unreachable(config, e))?;

    if !reply.ok
    {   let message = super::error_message(&reply.body, config);
        error!("OpenAI API error ({}): {}", reply.status, message);
        return Err(classify_upstream_failure(reply.status, message));
    }

    let text = extract_text(&reply.body);
    if text.is_empty()
    {   return Err(super::empty_response(config));
    }
    Ok(text)
}
