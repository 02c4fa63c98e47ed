use thiserror::Error;

/// Error taxonomy for the gateway.
/// Every variant maps to one HTTP status and one client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError
{   /// Bad or missing input, never sent upstream
    #[error("{0}")]
    Validation(String)
  , /// Missing credential or bad process configuration
    #[error("{0}")]
    Configuration(String)
  , /// Upstream says the model itself is unknown or unavailable.
    /// Consumed by the fallback loop.
    #[error("{message}")]
    UpstreamModelUnavailable
    {   status: u16
      , message: String
    }
  , /// Upstream rejected the request for another reason
    #[error("{message}")]
    UpstreamRequest
    {   status: u16
      , message: String
    }
  , /// Upstream succeeded but produced no text
    #[error("{0}")]
    UpstreamEmpty(String)
  , /// Network-level failure talking to the provider
    #[error("{0}")]
    UpstreamUnreachable(String)
}

impl GatewayError
{   /// HTTP status reported to the caller
    pub fn status_code(&self) -> u16
    {   match self
        {   GatewayError::Validation(_) => 400
          , GatewayError::Configuration(_) => 500
          , GatewayError::UpstreamModelUnavailable { status, .. } => *status
          , GatewayError::UpstreamRequest { status, .. } => *status
          , GatewayError::UpstreamEmpty(_) => 502
          , GatewayError::UpstreamUnreachable(_) => 500
        }
    }

    /// Whether the fallback loop may move on to the next model
    pub fn is_model_unavailable(&self) -> bool
    {   matches!(self, GatewayError::UpstreamModelUnavailable { .. })
    }

    /// Collapse the internal-only variant into a surfaced one
    pub fn surfaced(self) -> Self
    {   match self
        {   GatewayError::UpstreamModelUnavailable { status, message } => {
              GatewayError::UpstreamRequest { status, message }
            }
          , other => other
        }
    }
}
