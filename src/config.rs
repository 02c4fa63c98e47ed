//! Configuration for the gateway providers and the local server

use std::fmt;
use std::path::{Path, PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::env_file;
use crate::error::GatewayError;

pub const DEFAULT_PORT: u16 = 3000;

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const GEMINI_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Provider configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Provider name, used in client-facing messages
    pub name: String
  , /// Credential, never serialized
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>
  , /// Preferred model name
    pub model: String
  , /// API base URL without trailing slash
    pub api_base: String
}

impl fmt::Debug for ProviderConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ProviderConfig")
          .field("name", &self.name)
          .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
          .field("model", &self.model)
          .field("api_base", &self.api_base)
          .finish()
    }
}

/// Gateway configuration, built once at startup and immutable afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig
{   /// Port for the local server
    pub port: u16
  , /// Project root for static files and `.env`
    pub root: PathBuf
  , /// Google Gemini settings
    pub gemini: ProviderConfig
  , /// OpenAI settings
    pub openai: ProviderConfig
}

impl GatewayConfig
{   /// Apply `env_path` to the process environment, then build from it.
    ///
    /// Mutates the process environment. Call before the async runtime
    /// starts.
    pub fn load(root: PathBuf, env_path: &Path) -> Result<Self, GatewayError>
    {   env_file::load(env_path).map_err(|e| {
          GatewayError::Configuration(
            format!("Cannot read {}: {}", env_path.display(), e)
          )
        })?;
        Self::from_env(root)
    }

    /// Build from the process environment
    pub fn from_env(root: PathBuf) -> Result<Self, GatewayError>
    {   Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(
      root: PathBuf
    , lookup: F
    ) -> Result<Self, GatewayError>
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| {
          lookup(key).filter(|value| !value.is_empty())
        };

        let port = match get("PORT")
        {   Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
              GatewayError::Configuration(
                format!("Invalid PORT value: {}", raw)
              )
            })?
          , None => DEFAULT_PORT
        };

        let gemini = ProviderConfig
        {   name: "Gemini".to_string()
          , api_key: get("GEMINI_API_KEY")
              .or_else(|| get("GOOGLE_API_KEY"))
              .or_else(|| get("AI_STUDIO_API_KEY"))
          , model: get("GEMINI_MODEL")
              .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string())
          , api_base: trim_base(
              get("GEMINI_API_BASE")
                .unwrap_or_else(|| GEMINI_API_BASE.to_string())
            )
        };

        let openai = ProviderConfig
        {   name: "OpenAI".to_string()
          , api_key: get("OPENAI_API_KEY")
          , model: get("OPENAI_MODEL")
              .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string())
          , api_base: trim_base(
              get("OPENAI_API_BASE")
                .unwrap_or_else(|| OPENAI_API_BASE.to_string())
            )
        };

        debug!(
          "Loaded config: port={}, gemini model={}, openai model={}",
          port, gemini.model, openai.model
        );

        Ok(GatewayConfig
        {   port
          , root
          , gemini
          , openai
        })
    }
}

fn trim_base(base: String) -> String
{   base.trim_end_matches('/').to_string()
}
