//! Outbound HTTP dispatch: sends a single request and reports back a
//! bounded summary of the response, never the raw `reqwest` types.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use webhook_core::HeaderPair;

/// A response truncated (if necessary) to `max_response_bytes`.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    pub status: u16,
    pub headers: Vec<HeaderPair>,
    pub body: Vec<u8>,
    pub body_truncated: bool,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

mod duration_millis {
    use super::Duration;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u128(value.as_millis())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Sends one outbound request with a fixed timeout and caps how much of
/// the response body it keeps in memory.
pub struct Dispatcher {
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl Dispatcher {
    pub fn new(timeout: Duration, max_response_bytes: usize) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_response_bytes,
        })
    }

    /// Sends `method`/`body` to `url` with `headers`, returning a
    /// summary of the response truncated to `max_response_bytes`.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[HeaderPair],
        body: Vec<u8>,
    ) -> Result<DispatchResponse, DispatchError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .unwrap_or(reqwest::Method::POST);
        let mut request = self.client.request(method, url);
        for header in headers {
            request = request.header(&header.key, &header.value);
        }
        request = request.body(body);

        let start = std::time::Instant::now();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                HeaderPair::new(name.as_str(), value.to_str().unwrap_or_default())
            })
            .collect();

        let full_body = response.bytes().await?;
        let body_truncated = full_body.len() > self.max_response_bytes;
        let body = full_body
            .iter()
            .take(self.max_response_bytes)
            .copied()
            .collect();

        Ok(DispatchResponse {
            status,
            headers: response_headers,
            body,
            body_truncated,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_method_headers_and_body_and_caps_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_string("0123456789"))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(Duration::from_secs(5), 4).unwrap();
        let url = format!("{}/hook", server.uri());
        let response = dispatcher
            .send(
                "POST",
                &url,
                &[HeaderPair::new("X-Test", "1")],
                b"payload".to_vec(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"0123");
        assert!(response.body_truncated);
    }
}
