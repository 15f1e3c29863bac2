// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client side of the lead API.
//!
//! Two endpoints:
//! - `GET csrf-token` answering `{success, token}`
//! - `POST submit` taking a [`LeadPayload`] and answering with a
//!   [`SubmitResponseBody`] whose shape depends on the status code
//!
//! Responses are returned raw; deciding what they mean is the pipeline's job.

use crate::config::SubmissionConfig;
use crate::error::BackendError;
use crate::validator::{sanitize, LeadForm};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Body posted to the submit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub consent: bool,
    pub csrf_token: String,
    pub recaptcha_token: String,
    /// Honeypot, forwarded as typed so the backend can judge it
    pub website: String,
}

impl LeadPayload {
    /// Build the sanitized payload for `form`.
    pub fn new(form: &LeadForm, csrf_token: String, recaptcha_token: String) -> Self {
        Self {
            name: sanitize(form.name.trim()),
            email: sanitize(form.email.trim()),
            phone: sanitize(form.phone_number.trim()),
            consent: form.consent,
            csrf_token,
            recaptcha_token,
            website: form.website.clone(),
        }
    }
}

/// Submit endpoint response body. Every field is optional because each
/// status code fills a different subset.
///
/// Fields are decoded one at a time: a field of an unexpected type is read
/// as absent instead of discarding the rest of the body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmitResponseBody {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    /// Accepted as a string or a number
    #[serde(default, deserialize_with = "lenient_string")]
    pub record_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Seconds until the backend accepts another submission (HTTP 429)
    #[serde(default, deserialize_with = "lenient_secs")]
    pub retry_after: Option<u64>,
    /// Field errors (HTTP 400), an object keyed by field or a list
    #[serde(default)]
    pub validation_errors: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub error: Option<String>,
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.ceil() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Status code and decoded body of a submit call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: SubmitResponseBody,
}

impl BackendResponse {
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    token: Option<String>,
}

/// Backend collaborator.
#[async_trait]
pub trait LeadBackend: Send + Sync {
    async fn fetch_csrf_token(&self) -> Result<String, BackendError>;
    async fn submit(&self, payload: &LeadPayload) -> Result<BackendResponse, BackendError>;
}

/// HTTP implementation of [`LeadBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    csrf_url: Url,
    submit_url: Url,
}

impl HttpBackend {
    pub fn new(config: &SubmissionConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.api_base)?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            csrf_url: base.join(&config.csrf_path)?,
            submit_url: base.join(&config.submit_path)?,
        })
    }
}

#[async_trait]
impl LeadBackend for HttpBackend {
    async fn fetch_csrf_token(&self) -> Result<String, BackendError> {
        debug!(url = %self.csrf_url, "Fetching CSRF token");
        let response = self
            .client
            .get(self.csrf_url.clone())
            .send()
            .await?
            .error_for_status()?;

        match response.json::<CsrfResponse>().await? {
            CsrfResponse {
                success: true,
                token: Some(token),
            } if !token.is_empty() => Ok(token),
            _ => Err(BackendError::UnexpectedResponse(
                "CSRF endpoint returned no token".to_string(),
            )),
        }
    }

    async fn submit(&self, payload: &LeadPayload) -> Result<BackendResponse, BackendError> {
        debug!(url = %self.submit_url, "Submitting lead");
        let response = self
            .client
            .post(self.submit_url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            SubmitResponseBody::default()
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(status, error = %e, "Submit response is not JSON");
                SubmitResponseBody::default()
            })
        };

        Ok(BackendResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{interpret, SubmissionOutcome};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form() -> LeadForm {
        LeadForm {
            name: "  Ana <b>Díaz</b> ".to_string(),
            email: "ana@example.cl".to_string(),
            phone_number: "+56 9 8765 4321".to_string(),
            consent: true,
            website: String::new(),
        }
    }

    async fn backend_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&SubmissionConfig {
            api_base: format!("{}/api/", server.uri()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_payload_is_sanitized_and_trimmed() {
        let payload = LeadPayload::new(&form(), "csrf".into(), "captcha".into());
        assert_eq!(payload.name, "Ana &lt;b&gt;Díaz&lt;/b&gt;");
        assert_eq!(payload.phone, "+56 9 8765 4321");
        assert!(payload.consent);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackend::new(&SubmissionConfig {
            api_base: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_csrf_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/csrf-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"success": true, "token": "tok-123"})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        assert_eq!(backend.fetch_csrf_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn test_fetch_csrf_token_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/csrf-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": false})))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        assert!(matches!(
            backend.fetch_csrf_token().await,
            Err(BackendError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_posts_payload_and_decodes_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .and(body_partial_json(serde_json::json!({
                "email": "ana@example.cl",
                "csrf_token": "csrf",
                "recaptcha_token": "captcha",
                "website": ""
            })))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(serde_json::json!({"retry_after": 42})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let payload = LeadPayload::new(&form(), "csrf".into(), "captcha".into());
        let response = backend.submit(&payload).await.unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(response.body.retry_after, Some(42));
    }

    #[tokio::test]
    async fn test_submit_tolerates_non_json_error_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let payload = LeadPayload::new(&form(), "csrf".into(), "captcha".into());
        let response = backend.submit(&payload).await.unwrap();

        assert_eq!(response.status, 502);
        assert_eq!(response.body, SubmitResponseBody::default());
    }

    #[tokio::test]
    async fn test_numeric_record_id_still_reads_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"success": true, "record_id": 12345, "message": "ok"}),
            ))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let payload = LeadPayload::new(&form(), "csrf".into(), "captcha".into());
        let response = backend.submit(&payload).await.unwrap();

        assert!(response.body.success);
        assert_eq!(response.body.record_id.as_deref(), Some("12345"));
        assert_eq!(
            interpret(response, &form()),
            SubmissionOutcome::Success {
                message: "ok".to_string(),
                record_id: Some("12345".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_string_retry_after_is_honoured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/submit"))
            .respond_with(ResponseTemplate::new(429).set_body_json(
                serde_json::json!({"retry_after": "120", "error": "Demasiadas solicitudes"}),
            ))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let payload = LeadPayload::new(&form(), "csrf".into(), "captcha".into());
        let response = backend.submit(&payload).await.unwrap();

        assert_eq!(response.body.retry_after, Some(120));
        assert_eq!(response.body.error.as_deref(), Some("Demasiadas solicitudes"));
        assert_eq!(
            interpret(response, &form()),
            SubmissionOutcome::RateLimited { retry_after_secs: 120 }
        );
    }

    #[test]
    fn test_bad_retry_after_is_dropped_alone() {
        let body: SubmitResponseBody = serde_json::from_value(serde_json::json!({
            "retry_after": {"seconds": 5},
            "error": "Demasiadas solicitudes"
        }))
        .unwrap();
        assert_eq!(body.retry_after, None);
        assert_eq!(body.error.as_deref(), Some("Demasiadas solicitudes"));
    }
}
