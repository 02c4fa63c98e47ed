use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, error, trace};

use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::failover::{classify_upstream_failure, run_candidates, ModelCandidates};
use crate::request::GenerationRequest;

/// Tried in this order after the configured model
pub const FALLBACK_MODELS: [&str; 2]
  = ["gemini-2.0-flash", "gemini-1.5-flash"];

// ===== Message Types =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content
{   #[serde(default)]
    pub parts: Vec<Part>
}

impl Content
{   fn text(text: &str) -> Self
    {   Content
        {   parts: vec![Part { text: Some(text.to_string()) }]
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub response_mime_type: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest
{   pub contents: Vec<Content>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>
}

// ===== Normalization =====

/// Build the `generateContent` payload
pub fn build_payload(request: &GenerationRequest) -> GeminiRequest
{   GeminiRequest
    {   contents: vec![Content::text(&request.prompt)]
      , system_instruction: request
          .system_instruction
          .as_deref()
          .map(Content::text)
      , generation_config: request.is_json.then(|| GenerationConfig
        {   response_mime_type: "application/json".to_string()
        })
    }
}

/// Text parts of the first candidate, newline-joined and trimmed.
/// A part without string `text` contributes an empty line.
pub fn extract_text(body: &Value) -> String
{   body.pointer("/candidates/0/content/parts")
      .and_then(Value::as_array)
      .map(|parts| {
        parts
          .iter()
          .map(|part| part.get("text").and_then(Value::as_str).unwrap_or(""))
          .collect::<Vec<_>>()
          .join("\n")
      })
      .unwrap_or_default()
      .trim()
      .to_string()
}

/// Model endpoint without the credential
pub fn endpoint(api_base: &str, model: &str) -> String
{   format!(
      "{}/models/{}:generateContent",
      api_base,
      urlencoding::encode(model)
    )
}

// ===== Calls =====

/// Generate text, walking the model candidates on "model unavailable"
pub async fn generate(
  http: &reqwest::Client
, config: &ProviderConfig
, api_key: &str
, request: &GenerationRequest
) -> Result<String, GatewayError>
{   let payload = build_payload(request);
    trace!("Gemini request: {:?}", payload);

    let candidates = ModelCandidates::new(&config.model, &FALLBACK_MODELS);
    run_candidates(
      &candidates,
      super::exhausted(config),
      |model| call_model(http, config, api_key, model, &payload)
    ).await
}

async fn call_model(
  http: &reqwest::Client
, config: &ProviderConfig
, api_key: &str
, model: String
, payload: &GeminiRequest
) -> Result<String, GatewayError>
{   debug!("Calling Gemini model: {}", model);

    let response = http
      .post(endpoint(&config.api_base, &model))
      .query(&[("key", api_key)])
      .json(payload)
      .send()
      .await
      .map_err(|e| super::unreachable(config, e))?;

    let reply = super::read_reply(response)
      .await
      .map_err(|e| super::unreachable(config, e))?;

    if !reply.ok
    {   let message = super::error_message(&reply.body, config);
        error!("Gemini API error ({}): {}", reply.status, message);
        return Err(classify_upstream_failure(reply.status, message));
    }

    let text = extract_text(&reply.body);
    if text.is_empty()
    {   return Err(super::empty_response(config));
    }
    Ok(text)
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn payload_carries_optional_fields_only_when_set()
    {   let plain = build_payload(&GenerationRequest::new("hello"));
        assert_eq!(
          serde_json::to_value(&plain).unwrap(),
          json!({ "contents": [{ "parts": [{ "text": "hello" }] }] })
        );

        let full = build_payload(&GenerationRequest
        {   prompt: "hello".to_string()
          , system_instruction: Some("be brief".to_string())
          , is_json: true
        });
        assert_eq!(
          serde_json::to_value(&full).unwrap(),
          json!({
            "contents": [{ "parts": [{ "text": "hello" }] }],
            "systemInstruction": { "parts": [{ "text": "be brief" }] },
            "generationConfig": { "responseMimeType": "application/json" }
          })
        );
    }

    #[test]
    fn text_parts_are_joined()
    {   let body = json!({
          "candidates": [{
            "content": { "parts": [{ "text": " a" }, {}, { "text": "b " }] }
          }, {
            "content": { "parts": [{ "text": "ignored" }] }
          }]
        });
        assert_eq!(extract_text(&body), "a\n\nb");
        assert_eq!(extract_text(&json!({})), "");
        assert_eq!(extract_text(&json!({ "candidates": [] })), "");
    }

    #[test]
    fn off_shape_parts_keep_the_rest_of_the_text()
    {   let body = json!({
          "candidates": [{
            "content": { "parts": [null, { "text": "first" }, { "text": 7 }, "loose", { "text": "last" }] }
          }]
        });
        assert_eq!(extract_text(&body), "first\n\n\nlast");

        let no_parts = json!({ "candidates": [{ "content": { "parts": "text" } }] });
        assert_eq!(extract_text(&no_parts), "");
    }

    #[test]
    fn endpoint_encodes_model()
    {   assert_eq!(
          endpoint("http://h/v1beta", "models x"),
          "http://h/v1beta/models/models%20x:generateContent"
        );
    }
}
