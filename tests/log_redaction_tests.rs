mod common;

use std::sync::{Mutex, Once};

use log::{LevelFilter, Log, Metadata, Record};
use promptgate::{GenerationRequest, GenerationResult, Provider};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::gateway_for;

const SECRET: &str = "SUPER-SECRET-KEY";

/// Keeps every formatted record so tests can search them
struct RecordingLogger
{   lines: Mutex<Vec<String>>
}

impl Log for RecordingLogger
{   fn enabled(&self, _: &Metadata) -> bool
    {   true
    }

    fn log(&self, record: &Record)
    {   let line = format!("{} {}", record.level(), record.args());
        if let Ok(mut lines) = self.lines.lock()
        {   lines.push(line);
        }
    }

    fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger { lines: Mutex::new(Vec::new()) };
static INSTALL: Once = Once::new();

fn recorded_lines() -> Vec<String>
{   INSTALL.call_once(|| {
      log::set_logger(&LOGGER).expect("logger installed once");
      log::set_max_level(LevelFilter::Trace);
    });
    LOGGER.lines.lock().unwrap().clone()
}

fn assert_secret_not_logged()
{   let leaked: Vec<String> = recorded_lines()
      .into_iter()
      .filter(|line| line.contains(SECRET))
      .collect();
    assert!(leaked.is_empty(), "key written to the log: {:?}", leaked);
}

#[tokio::test]
async fn test_connection_failure_log_omits_the_key()
{   recorded_lines();
    let gateway = gateway_for("http://127.0.0.1:1", &[("GEMINI_API_KEY", SECRET)]);

    let result = gateway
      .generate(Provider::Gemini, &GenerationRequest::new("hello"))
      .await;

    assert_eq!(result.status_code(), 500);
    assert_eq!(result.to_json(), json!({ "error": "Failed to reach Gemini API." }));
    assert!(
      recorded_lines().iter().any(|line| line.contains("HTTP error reaching Gemini")),
      "transport failure should still be logged"
    );
    assert_secret_not_logged();
}

#[tokio::test]
async fn test_upstream_error_log_omits_the_key()
{   recorded_lines();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(403)
          .set_body_json(common::upstream_error(403, "API key not valid"))
      )
      .mount(&server)
      .await;
    let gateway = gateway_for(&server.uri(), &[("GEMINI_API_KEY", SECRET)]);

    let result = gateway
      .generate(Provider::Gemini, &GenerationRequest::new("hello"))
      .await;

    assert_eq!(
      result,
      GenerationResult::Failure
      {   error: "API key not valid".to_string()
        , status_code: 403
      }
    );
    assert_secret_not_logged();
}
