//! Gateway handler: one request contract over every provider

use std::sync::Arc;
use log::{debug, info, warn};
use serde_json::json;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::providers;
use crate::request::{GenerationRequest, GenerationResult};
use crate::transport::{ResponseSink, ShimRequest};
use crate::Provider;

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed. Use POST.";

/// Shared handler state. Cheap to clone; holds no per-request data.
#[derive(Debug, Clone)]
pub struct Gateway
{   config: Arc<GatewayConfig>
  , http: reqwest::Client
}

impl Gateway
{   /// Create a gateway with its own HTTP client
    pub fn new(config: Arc<GatewayConfig>) -> Self
    {   Self::with_client(config, reqwest::Client::new())
    }

    /// Create a gateway around an existing HTTP client
    pub fn with_client(
      config: Arc<GatewayConfig>
    , http: reqwest::Client
    ) -> Self
    {   debug!("Creating Gateway");
        Gateway { config, http }
    }

    pub fn config(&self) -> &GatewayConfig
    {   &self.config
    }

    /// Run one normalized request against a provider
    pub async fn generate(
      &self
    , provider: Provider
    , request: &GenerationRequest
    ) -> GenerationResult
    {   GenerationResult::from(self.try_generate(provider, request).await)
    }

    async fn try_generate(
      &self
    , provider: Provider
    , request: &GenerationRequest
    ) -> Result<String, GatewayError>
    {   let settings = provider.settings(&self.config);
        let api_key = settings.api_key.as_deref().ok_or_else(|| {
          warn!("No API key configured for {}", settings.name);
          GatewayError::Configuration(provider.missing_key_message())
        })?;

        info!(
          "Generating with {} (json={}, system={})",
          settings.name,
          request.is_json,
          request.system_instruction.is_some()
        );

        match provider
        {   Provider::Gemini => {
              providers::gemini::generate(&self.http, settings, api_key, request)
                .await
            }
          , Provider::OpenAI => {
              providers::openai::generate(&self.http, settings, api_key, request)
                .await
            }
        }
    }

    /// Serve one request through whichever transport supplied the sink.
    /// Always finalizes `res`.
    pub async fn handle<S>(
      &self
    , provider: Provider
    , request: ShimRequest
    , res: &mut S
    )
    where
      S: ResponseSink + Send
    {   debug!("{} {}", request.method, provider.route());

        if request.method != "POST"
        {   res.set_header("Allow", "POST");
            res.status(405).json(&json!({ "error": METHOD_NOT_ALLOWED }));
            return;
        }

        let parsed = request.body
          .into_json()
          .and_then(|body| GenerationRequest::from_json(&body));

        let result = match parsed
        {   Ok(generation) => self.generate(provider, &generation).await
          , Err(e) => {
              debug!("Rejected request: {}", e);
              GenerationResult::from(e)
            }
        };

        res.status(result.status_code()).json(&result.to_json());
    }
}
