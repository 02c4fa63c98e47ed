//! Model fallback logic for providers with several models

use std::future::Future;
use log::{debug, warn};

use crate::error::GatewayError;

/// Phrases that mark an upstream error as "this model is unusable".
/// Matched case-insensitively. This is a wording heuristic, not an
/// upstream contract.
const MODEL_UNAVAILABLE_PHRASES: [&str; 3]
  = ["not found", "unsupported", "not available"];

/// Ordered, duplicate-free list of model names to try
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates
{   models: Vec<String>
}

impl ModelCandidates
{   /// Preferred model first, then the fallbacks, first occurrence wins
    pub fn new(preferred: &str, fallbacks: &[&str]) -> Self
    {   let mut models: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);
        for model in std::iter::once(preferred).chain(fallbacks.iter().copied())
        {   if !models.iter().any(|m| m == model)
            {   models.push(model.to_string());
            }
        }
        debug!("Model candidates: {:?}", models);
        ModelCandidates { models }
    }

    /// A list holding only one model
    pub fn single(model: &str) -> Self
    {   Self::new(model, &[])
    }

    pub fn models(&self) -> &[String]
    {   &self.models
    }

    pub fn len(&self) -> usize
    {   self.models.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.models.is_empty()
    }
}

/// True when an upstream failure says the model itself is the problem
pub fn is_model_unavailable(status: u16, message: &str) -> bool
{   if status != 400 && status != 404
    {   return false;
    }
    let message = message.to_lowercase();
    MODEL_UNAVAILABLE_PHRASES
      .iter()
      .any(|phrase| message.contains(phrase))
}

/// Turn a non-success upstream status into the right error variant
pub fn classify_upstream_failure(
  status: u16
, message: String
) -> GatewayError
{   if is_model_unavailable(status, &message)
    {   GatewayError::UpstreamModelUnavailable { status, message }
    } else
    {   GatewayError::UpstreamRequest { status, message }
    }
}

/// Try each candidate in order, one at a time.
///
/// Moves on only after a model-unavailable failure. Any other error is
/// returned at once. When every candidate is used up, the last failure
/// is returned.
pub async fn run_candidates<F, Fut>(
  candidates: &ModelCandidates
, exhausted: GatewayError
, mut attempt: F
) -> Result<String, GatewayError>
where
  F: FnMut(String) -> Fut
, Fut: Future<Output = Result<String, GatewayError>>
{   let mut last_error = exhausted;

    for (index, model) in candidates.models().iter().enumerate()
    {   debug!(
          "Attempt {}/{} with model: {}",
          index + 1, candidates.len(), model
        );
        match attempt(model.clone()).await
        {   Ok(text) => return Ok(text)
          , Err(e) if e.is_model_unavailable() => {
              warn!("Model {} unavailable, trying next: {}", model, e);
              last_error = e;
            }
          , Err(e) => return Err(e)
        }
    }

    debug!("All {} model candidates exhausted", candidates.len());
    Err(last_error.surfaced())
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn candidates_keep_order_and_drop_duplicates()
    {   let list = ModelCandidates::new(
          "gemini-2.0-flash",
          &["gemini-2.0-flash", "gemini-1.5-flash"]
        );
        assert_eq!(list.models(), ["gemini-2.0-flash", "gemini-1.5-flash"]);

        let list = ModelCandidates::new(
          "custom",
          &["gemini-2.0-flash", "gemini-1.5-flash"]
        );
        assert_eq!(
          list.models(),
          ["custom", "gemini-2.0-flash", "gemini-1.5-flash"]
        );
    }

    #[test]
    fn model_unavailable_needs_status_and_phrase()
    {   assert!(is_model_unavailable(404, "models/x is NOT FOUND for v1beta"));
        assert!(is_model_unavailable(400, "Unsupported model"));
        assert!(is_model_unavailable(400, "model is not available in region"));
        assert!(!is_model_unavailable(400, "API key not valid"));
        assert!(!is_model_unavailable(403, "model not found"));
        assert!(!is_model_unavailable(500, "not available"));
    }
}
