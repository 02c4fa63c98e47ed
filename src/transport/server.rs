//! Standalone server transport.
//!
//! Every inbound request lands in one fallback handler. API routes are
//! turned into a [`ShimRequest`] plus a [`ShimResponse`] and handed to the
//! gateway; every other path is served from the project root.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures::FutureExt;
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::{panic_message, RequestBody, ResponseSink, ShimRequest, INVALID_JSON, JSON_CONTENT_TYPE};
use crate::gateway::Gateway;
use crate::static_files;
use crate::Provider;

pub const SERVER_ERROR: &str = "Local dev server error.";

/// Failures caught at the transport boundary, reported as a generic 500
#[derive(Debug, Error)]
pub enum ServerError
{   #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error)
  , #[error("handler panicked: {0}")]
    Panicked(String)
  , #[error("handler finished without sending a response")]
    NoResponse
}

/// Application state shared across requests
#[derive(Debug)]
pub struct ServerState
{   pub gateway: Gateway
  , pub root: PathBuf
}

/// Sink that sends an axum response the first time `json` is called
pub struct ShimResponse
{   status: u16
  , headers: HeaderMap
  , sender: Option<oneshot::Sender<Response>>
}

impl ShimResponse
{   pub fn new(sender: oneshot::Sender<Response>) -> Self
    {   ShimResponse
        {   status: 200
          , headers: HeaderMap::new()
          , sender: Some(sender)
        }
    }
}

impl ResponseSink for ShimResponse
{   fn set_header(&mut self, name: &str, value: &str)
    {   match (
          HeaderName::from_bytes(name.as_bytes()),
          HeaderValue::from_str(value),
        )
        {   (Ok(name), Ok(value)) => {
              self.headers.insert(name, value);
            }
          , _ => warn!("Dropping invalid header: {}", name)
        }
    }

    fn status(&mut self, code: u16) -> &mut Self
    {   self.status = code;
        self
    }

    fn json(&mut self, payload: &Value)
    {   let Some(sender) = self.sender.take() else
        {   warn!("Response already sent, dropping second body");
            return;
        };

        let mut headers = std::mem::take(&mut self.headers);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut response = Response::new(Body::from(payload.to_string()));
        *response.status_mut() = StatusCode::from_u16(self.status)
          .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *response.headers_mut() = headers;

        if sender.send(response).is_err()
        {   warn!("Connection dropped before response was sent");
        }
    }

    fn is_sent(&self) -> bool
    {   self.sender.is_none()
    }
}

/// Build the router: one fallback handler for every path
pub fn build_router(gateway: Gateway) -> Router
{   let root = gateway.config().root.clone();
    Router::new()
      .fallback(dispatch)
      .with_state(Arc::new(ServerState { gateway, root }))
}

/// Serve until the listener fails
pub async fn serve(
  listener: TcpListener
, gateway: Gateway
) -> std::io::Result<()>
{   if let Ok(addr) = listener.local_addr()
    {   info!("Local dev server running at http://localhost:{}", addr.port());
    }
    axum::serve(listener, build_router(gateway)).await
}

async fn dispatch(
  State(state): State<Arc<ServerState>>
, request: Request
) -> Response
{   let path = request.uri().path().to_string();
    debug!("{} {}", request.method(), path);

    let result = match Provider::from_route(&path)
    {   Some(provider) => run_api_handler(&state, provider, request).await
      , None => Ok(serve_static(&state, &path).await)
    };

    result.unwrap_or_else(|e| {
      error!("Request to {} failed: {}", path, e);
      server_error(&e.to_string())
    })
}

async fn run_api_handler(
  state: &ServerState
, provider: Provider
, request: Request
) -> Result<Response, ServerError>
{   let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await?;
    let raw = String::from_utf8_lossy(&bytes);

    let parsed = if raw.trim().is_empty()
    {   Value::Object(Default::default())
    } else
    {   match serde_json::from_str(&raw)
        {   Ok(value) => value
          , Err(e) => {
              debug!("Invalid JSON body: {}", e);
              return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": INVALID_JSON })
              ));
            }
        }
    };

    let headers: HashMap<String, String> = parts.headers
      .iter()
      .filter_map(|(name, value)| {
        value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect();

    let shim = ShimRequest
    {   method: parts.method.as_str().to_string()
      , headers
      , body: RequestBody::Parsed(parsed)
    };

    Ok(respond_once(|mut res| async move {
      state.gateway.handle(provider, shim, &mut res).await
    }).await)
}

/// Run `handler` against a fresh [`ShimResponse`] and return what it sent.
/// A handler that panics or returns without calling `json` gets the
/// generic 500.
pub async fn respond_once<F, Fut>(handler: F) -> Response
where
  F: FnOnce(ShimResponse) -> Fut
, Fut: Future<Output = ()>
{   try_respond_once(handler).await.unwrap_or_else(|e| {
      error!("API handler failed: {}", e);
      server_error(&e.to_string())
    })
}

async fn try_respond_once<F, Fut>(handler: F) -> Result<Response, ServerError>
where
  F: FnOnce(ShimResponse) -> Fut
, Fut: Future<Output = ()>
{   let (sender, receiver) = oneshot::channel();
    let res = ShimResponse::new(sender);
    let outcome = AssertUnwindSafe(async move { handler(res).await })
      .catch_unwind()
      .await;

    match (receiver.await, outcome)
    {   (Ok(response), _) => Ok(response)
      , (Err(_), Err(panic)) => {
          Err(ServerError::Panicked(panic_message(panic.as_ref())))
        }
      , (Err(_), Ok(())) => Err(ServerError::NoResponse)
    }
}

async fn serve_static(state: &ServerState, path: &str) -> Response
{   match static_files::load(&state.root, path).await
    {   Some(file) => (
          StatusCode::OK,
          [(CONTENT_TYPE, file.content_type)],
          file.bytes,
        ).into_response()
      , None => (
          StatusCode::NOT_FOUND,
          [(CONTENT_TYPE, "text/plain; charset=utf-8")],
          static_files::NOT_FOUND,
        ).into_response()
    }
}

fn json_response(status: StatusCode, payload: &Value) -> Response
{   (
      status,
      [(CONTENT_TYPE, JSON_CONTENT_TYPE)],
      payload.to_string(),
    ).into_response()
}

fn server_error(details: &str) -> Response
{   json_response(
      StatusCode::INTERNAL_SERVER_ERROR,
      &json!({ "error": SERVER_ERROR, "details": details })
    )
}
