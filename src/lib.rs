pub mod error;
pub mod config;
pub mod env_file;
pub mod providers;
pub mod request;
pub mod failover;
pub mod gateway;
pub mod static_files;
pub mod transport;

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use request::{GenerationRequest, GenerationResult};

/*

promptgate: one "generate text" contract in front of several LLM
providers, with model fallback, runnable either as a serverless
function or as a local HTTP server.

src/
├── lib.rs            # Provider enum and re-exports
├── error.rs          # GatewayError taxonomy
├── config.rs         # GatewayConfig, built once at startup
├── env_file.rs       # .env loading
├── request.rs        # GenerationRequest / GenerationResult
├── failover.rs       # Model candidates and fallback loop
├── gateway.rs        # Gateway handler
├── providers/        # Provider wire formats
│   ├── gemini.rs
│   └── openai.rs
├── static_files.rs   # Static file serving for the local server
├── transport/        # ResponseSink and the two transports
│   ├── serverless.rs
│   └── server.rs
└── main.rs           # CLI: serve | invoke

*/

/// Supported LLM providers.
/// Each variant owns one API route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider
{   /// Google Gemini (AI Studio `generateContent`)
    Gemini
  , /// OpenAI Chat Completions
    OpenAI
}

impl Provider
{   pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::OpenAI];

    /// Lowercase name, as used in routes and on the command line
    pub fn name(&self) -> &'static str
    {   match self
        {   Provider::Gemini => "gemini"
          , Provider::OpenAI => "openai"
        }
    }

    /// Exact API path served by this provider
    pub fn route(&self) -> &'static str
    {   match self
        {   Provider::Gemini => "/api/gemini"
          , Provider::OpenAI => "/api/openai"
        }
    }

    /// Provider for an exact API path
    pub fn from_route(path: &str) -> Option<Provider>
    {   Provider::ALL.into_iter().find(|p| p.route() == path)
    }

    /// This provider's slice of the configuration
    pub fn settings<'a>(
      &self
    , config: &'a GatewayConfig
    ) -> &'a config::ProviderConfig
    {   match self
        {   Provider::Gemini => &config.gemini
          , Provider::OpenAI => &config.openai
        }
    }

    /// Operator hint returned when no credential is configured
    pub fn missing_key_message(&self) -> String
    {   match self
        {   Provider::Gemini => {
              "Missing Gemini API key. Set GEMINI_API_KEY (or GOOGLE_API_KEY) \
               in your environment and redeploy/restart."
                .to_string()
            }
          , Provider::OpenAI => {
              "Missing OpenAI API key. Set OPENAI_API_KEY \
               in your environment and redeploy/restart."
                .to_string()
            }
        }
    }
}

impl fmt::Display for Provider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.name())
    }
}

impl FromStr for Provider
{   type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   Provider::ALL
          .into_iter()
          .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
          .ok_or_else(|| {
            let known: Vec<&str> = Provider::ALL.iter().map(Provider::name).collect();
            format!("unknown provider '{}', expected one of: {}", s, known.join(", "))
          })
    }
}
