//! Serverless transport: the platform hands over one event and expects
//! one reply value back.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use futures::FutureExt;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{panic_message, RequestBody, ResponseSink, ShimRequest, JSON_CONTENT_TYPE};
use crate::gateway::Gateway;
use crate::Provider;

pub const FUNCTION_ERROR: &str = "Serverless function error.";

/// Inbound platform event.
/// A JSON string `body` is the undecoded request text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerlessEvent
{   #[serde(default)]
    pub method: String
  , #[serde(default)]
    pub headers: HashMap<String, String>
  , #[serde(default)]
    pub body: Value
}

impl ServerlessEvent
{   pub fn into_shim(self) -> ShimRequest
    {   let body = match self.body
        {   Value::String(text) => RequestBody::Raw(text)
          , other => RequestBody::Parsed(other)
        };
        ShimRequest
        {   method: self.method.to_uppercase()
          , headers: self.headers
              .into_iter()
              .map(|(k, v)| (k.to_lowercase(), v))
              .collect()
          , body
        }
    }
}

/// Outbound reply handed back to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerlessReply
{   pub status_code: u16
  , pub headers: BTreeMap<String, String>
  , pub body: String
}

impl ServerlessReply
{   /// Decoded body
    pub fn json_body(&self) -> Result<Value, serde_json::Error>
    {   serde_json::from_str(&self.body)
    }
}

/// Sink that buffers the response until the invocation returns
#[derive(Debug, Clone)]
pub struct ServerlessResponse
{   status_code: u16
  , headers: BTreeMap<String, String>
  , body: Option<String>
}

impl ServerlessResponse
{   pub fn new() -> Self
    {   ServerlessResponse
        {   status_code: 200
          , headers: BTreeMap::new()
          , body: None
        }
    }

    /// The finished reply, or `None` if `json` was never called
    pub fn into_reply(self) -> Option<ServerlessReply>
    {   let body = self.body?;
        Some(ServerlessReply
        {   status_code: self.status_code
          , headers: self.headers
          , body
        })
    }
}

impl Default for ServerlessResponse
{   fn default() -> Self
    {   Self::new()
    }
}

impl ResponseSink for ServerlessResponse
{   fn set_header(&mut self, name: &str, value: &str)
    {   if self.is_sent()
        {   warn!("Header {} set after response was sent", name);
            return;
        }
        self.headers.insert(name.to_string(), value.to_string());
    }

    fn status(&mut self, code: u16) -> &mut Self
    {   if !self.is_sent()
        {   self.status_code = code;
        }
        self
    }

    fn json(&mut self, payload: &Value)
    {   if self.is_sent()
        {   warn!("Response already sent, dropping second body");
            return;
        }
        self.headers.insert(
          "Content-Type".to_string(),
          JSON_CONTENT_TYPE.to_string()
        );
        self.body = Some(payload.to_string());
    }

    fn is_sent(&self) -> bool
    {   self.body.is_some()
    }
}

/// Run one serverless invocation. Always returns a reply.
pub async fn invoke(
  gateway: &Gateway
, provider: Provider
, event: ServerlessEvent
) -> ServerlessReply
{   debug!("Serverless invoke for {}", provider.route());
    let shim = event.into_shim();
    respond_once(|mut res| async move {
      gateway.handle(provider, shim, &mut res).await;
      res
    }).await
}

/// Run `handler` against a fresh [`ServerlessResponse`] and return the
/// buffered reply. A handler that panics or hands back an unsent sink
/// gets the generic 500.
pub async fn respond_once<F, Fut>(handler: F) -> ServerlessReply
where
  F: FnOnce(ServerlessResponse) -> Fut
, Fut: Future<Output = ServerlessResponse>
{   let res = ServerlessResponse::new();
    let outcome = AssertUnwindSafe(async move { handler(res).await })
      .catch_unwind()
      .await;

    match outcome
    {   Ok(res) => res.into_reply().unwrap_or_else(|| {
          error!("Handler finished without a response");
          function_error()
        })
      , Err(panic) => {
          error!("Handler panicked: {}", panic_message(panic.as_ref()));
          function_error()
        }
    }
}

fn function_error() -> ServerlessReply
{   ServerlessReply
    {   status_code: 500
      , headers: BTreeMap::from([(
          "Content-Type".to_string(),
          JSON_CONTENT_TYPE.to_string()
        )])
      , body: json!({ "error": FUNCTION_ERROR }).to_string()
    }
}
