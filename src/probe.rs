// HTTP probe for authprobe
//
// One request in, one bounded snapshot out. Transport-level failures
// (refused connection, timeout, DNS) are converted to the status_code=0
// sentinel and never surface as errors; only a malformed method or URL is
// a hard failure, because the request could not even be built.

use crate::errors::ProbeError;
use crate::models::ResponseSnapshot;
use reqwest::{redirect, Client, Method};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Response bodies are truncated to this many characters to bound memory.
pub const MAX_CONTENT_CHARS: usize = 10_000;

pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout_ms: u64) -> Self {
        // Redirects are not followed: the auth-bypass analyzer inspects
        // 30x Location headers directly.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self {
            client,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Issue one request. Arbitrary methods and headers are supported; a
    /// JSON body is attached only for POST/PUT/PATCH when non-empty.
    pub async fn execute(
        &self,
        method: &str,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Map<String, Value>,
    ) -> Result<ResponseSnapshot, ProbeError> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ProbeError::InvalidMethod(method.to_string()))?;
        let url: reqwest::Url = url
            .parse()
            .map_err(|_| ProbeError::InvalidUrl(url.to_string()))?;

        let mut request = self.client.request(method.clone(), url).timeout(self.timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() && matches!(method.as_str(), "POST" | "PUT" | "PATCH") {
            request = request.json(body);
        }

        let start = Instant::now();
        let snapshot = match request.send().await {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let headers = response
                    .headers()
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.to_string(),
                            value.to_str().unwrap_or_default().to_string(),
                        )
                    })
                    .collect();
                let content = match response.text().await {
                    Ok(text) => truncate_content(&text),
                    Err(_) => String::new(),
                };
                ResponseSnapshot {
                    status_code,
                    content_length: content.chars().count(),
                    content,
                    headers,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                }
            }
            Err(e) => {
                debug!(error = %e, "probe transport failure");
                ResponseSnapshot::transport_failure(start.elapsed().as_millis() as u64)
            }
        };

        Ok(snapshot)
    }
}

fn truncate_content(text: &str) -> String {
    text.chars().take(MAX_CONTENT_CHARS).collect()
}
