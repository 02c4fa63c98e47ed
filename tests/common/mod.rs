#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use promptgate::{Gateway, GatewayConfig};
use serde_json::{json, Value};
use wiremock::MockServer;

/// Config pointing both providers at `base`, with test credentials.
/// `extra` overrides; an empty value unsets a key.
pub fn config_for(
  base: &str
, root: PathBuf
, extra: &[(&str, &str)]
) -> GatewayConfig
{   let mut vars: HashMap<String, String> = [
      ("GEMINI_API_KEY", "test-key"),
      ("GEMINI_API_BASE", base),
      ("OPENAI_API_KEY", "sk-test"),
      ("OPENAI_API_BASE", base),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra
    {   vars.insert(k.to_string(), v.to_string());
    }
    GatewayConfig::from_lookup(root, move |key| vars.get(key).cloned())
      .expect("test config")
}

pub fn gateway_for(base: &str, extra: &[(&str, &str)]) -> Gateway
{   Gateway::new(Arc::new(config_for(base, PathBuf::from("."), extra)))
}

/// Gemini success body with one text part
pub fn gemini_text(text: &str) -> Value
{   json!({
      "candidates": [{
        "content": { "role": "model", "parts": [{ "text": text }] },
        "finishReason": "STOP"
      }]
    })
}

/// Provider error body in the `{"error":{"message":..}}` shape
pub fn upstream_error(code: u16, message: &str) -> Value
{   json!({ "error": { "code": code, "message": message } })
}

/// Paths of every request the mock upstream received, in order
pub async fn received_paths(server: &MockServer) -> Vec<String>
{   server
      .received_requests()
      .await
      .unwrap_or_default()
      .iter()
      .map(|r| r.url.path().to_string())
      .collect()
}
