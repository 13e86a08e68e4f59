//! Ordered failover across redundant Overpass mirrors.
//!
//! [`ProviderGateway::fetch`] walks the configured endpoints once, in priority
//! order, and returns the first usable response. Timeouts, non-2xx statuses,
//! non-JSON payloads and provider runtime remarks all count as a failed
//! attempt and move on to the next mirror. There is no retry of the same
//! endpoint and no back-off. How a response is interpreted lives in
//! [`crate::normalize`].

use std::time::Duration;

use nearcare_core::{in_try_order, ProviderEndpoint, SearchQuery};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::{AttemptFailure, GatewayError};
use crate::overpass::{build_overpass_query, RawResponse};

/// Builds the shared HTTP client used for provider and geolocation calls.
///
/// Per-attempt deadlines are enforced by the callers; the client only bounds
/// connection setup.
///
/// # Errors
///
/// Returns `reqwest::Error` if the client cannot be constructed (e.g. TLS
/// backend initialisation fails).
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
}

/// Executes search queries against an ordered list of equivalent mirrors.
pub struct ProviderGateway {
    client: Client,
    /// Already sorted into try order.
    endpoints: Vec<ProviderEndpoint>,
    per_attempt_timeout: Duration,
}

impl ProviderGateway {
    #[must_use]
    pub fn new(
        client: Client,
        endpoints: &[ProviderEndpoint],
        per_attempt_timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoints: in_try_order(endpoints),
            per_attempt_timeout,
        }
    }

    /// Endpoints in the order they will be tried.
    #[must_use]
    pub fn endpoints(&self) -> &[ProviderEndpoint] {
        &self.endpoints
    }

    /// Runs `query` against the mirrors and returns the first usable response.
    ///
    /// At most one successful upstream call is made per invocation; endpoints
    /// after the first success are never contacted.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::NoEndpoints`] when no endpoints are configured.
    /// - [`GatewayError::AllExhausted`] when every endpoint failed, carrying
    ///   the classification and cause of the last failure.
    /// - [`GatewayError::Cancelled`] when `cancel` fires first. Any in-flight
    ///   request is dropped immediately.
    pub async fn fetch(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, GatewayError> {
        if self.endpoints.is_empty() {
            return Err(GatewayError::NoEndpoints);
        }

        let body = build_overpass_query(query, self.per_attempt_timeout);
        let mut last_failure: Option<AttemptFailure> = None;

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            let attempt = index + 1;
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            tracing::debug!(endpoint = %endpoint.url, attempt, "querying provider endpoint");

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(endpoint = %endpoint.url, attempt, "provider fetch cancelled");
                    return Err(GatewayError::Cancelled);
                }
                outcome = self.attempt(&endpoint.url, &body) => outcome,
            };

            match outcome {
                Ok(response) => {
                    tracing::debug!(
                        endpoint = %endpoint.url,
                        attempt,
                        elements = response.elements().len(),
                        "provider endpoint answered"
                    );
                    return Ok(response);
                }
                Err(failure) => {
                    tracing::warn!(
                        endpoint = %endpoint.url,
                        attempt,
                        classification = %failure.classification(),
                        error = %failure,
                        "provider endpoint failed; trying next"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        match last_failure {
            Some(last) => Err(GatewayError::AllExhausted {
                attempts: self.endpoints.len(),
                classification: last.classification(),
                last: Box::new(last),
            }),
            None => Err(GatewayError::NoEndpoints),
        }
    }

    /// One bounded attempt. The deadline covers connect, headers and body.
    async fn attempt(&self, url: &str, body: &str) -> Result<RawResponse, AttemptFailure> {
        match tokio::time::timeout(self.per_attempt_timeout, self.send(url, body)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AttemptFailure::Timeout {
                url: url.to_owned(),
                timeout: self.per_attempt_timeout,
            }),
        }
    }

    async fn send(&self, url: &str, body: &str) -> Result<RawResponse, AttemptFailure> {
        let transport =
            |e: reqwest::Error| AttemptFailure::from_reqwest(url, self.per_attempt_timeout, e);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(ACCEPT, "application/json")
            .body(body.to_owned())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if !content_type.as_deref().is_some_and(is_json_content_type) {
            return Err(AttemptFailure::UnexpectedContentType {
                content_type,
                url: url.to_owned(),
            });
        }

        let text = response.text().await.map_err(transport)?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| AttemptFailure::Deserialize {
                url: url.to_owned(),
                source: e,
            })?;

        if !body
            .get("elements")
            .is_some_and(serde_json::Value::is_array)
        {
            return Err(AttemptFailure::MissingElements {
                url: url.to_owned(),
            });
        }

        // Overpass reports server-side timeouts and memory exhaustion as a
        // 200 with a `remark`; the element list is then truncated or empty.
        if let Some(remark) = runtime_error_remark(&body) {
            return Err(AttemptFailure::ProviderRemark {
                url: url.to_owned(),
                remark: remark.to_owned(),
            });
        }

        Ok(RawResponse {
            served_by: url.to_owned(),
            body,
        })
    }
}

fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
}

fn runtime_error_remark(body: &serde_json::Value) -> Option<&str> {
    body.get("remark")
        .and_then(serde_json::Value::as_str)
        .filter(|r| r.trim_start().to_ascii_lowercase().starts_with("runtime error"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_content_type_accepts_charset_parameter() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("Application/JSON"));
    }

    #[test]
    fn json_content_type_rejects_other_types() {
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type("application/osm3s+xml"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn runtime_error_remark_is_detected() {
        let body = json!({
            "elements": [],
            "remark": "runtime error: Query timed out in \"query\" at line 3 after 26 seconds."
        });
        assert!(runtime_error_remark(&body).is_some());
    }

    #[test]
    fn informational_remark_is_ignored() {
        let body = json!({"elements": [], "remark": "note: results truncated for display"});
        assert!(runtime_error_remark(&body).is_none());
        assert!(runtime_error_remark(&json!({"elements": []})).is_none());
    }

    #[test]
    fn gateway_sorts_endpoints_into_try_order() {
        let client = build_http_client("nearcare-test/0.1").expect("client");
        let gateway = ProviderGateway::new(
            client,
            &[
                ProviderEndpoint::new("https://second.example/api", 2),
                ProviderEndpoint::new("https://first.example/api", 1),
            ],
            Duration::from_secs(5),
        );
        let urls: Vec<&str> = gateway.endpoints().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, ["https://first.example/api", "https://second.example/api"]);
    }
}
