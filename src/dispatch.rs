//! Sends payloads to model endpoints

use std::time::Duration;

use log::{error, info};
use reqwest::header::CONTENT_TYPE;

use crate::error::RunError;
use crate::request::Payload;
use crate::response::{classify, RawResponse, RunOutput};

/// Anything that can POST a payload and hand back the raw response.
pub trait Transport: Send + Sync {
    fn post(&self, endpoint: &str, payload: Payload) -> Result<RawResponse, RunError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// With `None` the client keeps reqwest's default timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, RunError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RunError::NetworkError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post(&self, endpoint: &str, payload: Payload) -> Result<RawResponse, RunError> {
        info!("🌐 Calling API endpoint: {} ({} parts)", endpoint, payload.parts().len());
        let form = payload.into_form()?;

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .map_err(|e| RunError::NetworkError(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|e| RunError::NetworkError(e.to_string()))?
            .to_vec();

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}

/// One full request/response cycle: post, check status, classify.
pub fn dispatch(
    transport: &dyn Transport,
    endpoint: &str,
    payload: Payload,
) -> Result<RunOutput, RunError> {
    let response = transport.post(endpoint, payload)?;

    if !response.is_success() {
        error!(
            "API error {} from {}: {}",
            response.status,
            endpoint,
            String::from_utf8_lossy(&response.body)
        );
        return Err(RunError::HttpError {
            status: response.status,
            reason: response.reason,
        });
    }

    classify(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;
    use crate::request::build_payload;

    struct Canned(RawResponse);

    impl Transport for Canned {
        fn post(&self, _endpoint: &str, _payload: Payload) -> Result<RawResponse, RunError> {
            Ok(self.0.clone())
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn post(&self, _endpoint: &str, _payload: Payload) -> Result<RawResponse, RunError> {
            Err(RunError::NetworkError("connection refused".to_string()))
        }
    }

    fn payload() -> Payload {
        let mut config = ModelConfig::new("ASR", "http://stub", "Input Text");
        config.inputs[0].set_text("hello").unwrap();
        build_payload(&config).unwrap()
    }

    #[test]
    fn test_server_error_becomes_http_error() {
        let mut raw = RawResponse::new(500, Some("text/plain"), "boom");
        raw.reason = "Internal Server Error".to_string();

        let err = dispatch(&Canned(raw), "http://stub", payload()).unwrap_err();
        assert_eq!(
            err,
            RunError::HttpError { status: 500, reason: "Internal Server Error".to_string() }
        );
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_success_is_classified() {
        let raw = RawResponse::new(200, Some("application/json"), r#"{"text":"hello"}"#);
        let output = dispatch(&Canned(raw), "http://stub", payload()).unwrap();
        assert_eq!(output.as_text(), Some("hello"));
    }

    #[test]
    fn test_transport_failure_passes_through() {
        let err = dispatch(&Unreachable, "http://stub", payload()).unwrap_err();
        assert!(matches!(err, RunError::NetworkError(_)));
    }
}
