//! HTTP transport: the only module that talks to the network.
//!
//! [`Transport`] owns a reusable `reqwest::Client` plus the default headers
//! every call carries. [`Transport::send`] issues one request and turns the
//! response into either a decoded JSON value or a typed
//! [`MiddlemanError`]; it keeps no per-call state and never retries.
//!
//! ## Status classification
//!
//! ```text
//! 2xx ──▶ parse JSON ──▶ Ok(Value)          (invalid JSON → Validation)
//! else ─▶ ErrorKind::from_status ─▶ Err(..) (remote message embedded)
//! I/O ──▶ Connection
//! ```

use crate::config::ClientConfig;
use crate::error::MiddlemanError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use std::time::{Duration, Instant};
use tracing::debug;

/// Header carrying the caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Remote error bodies longer than this are cut before being embedded.
const MAX_REMOTE_MESSAGE_CHARS: usize = 500;

/// Body of an outbound request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(FileUpload),
}

/// A single file sent as one part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field name, e.g. `pdf_file`.
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Reusable connection context bound to one [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    config: ClientConfig,
    default_headers: HeaderMap,
}

impl Transport {
    /// Build the HTTP client and default headers for `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, MiddlemanError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| MiddlemanError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: config.clone(),
            default_headers: default_headers(config.api_key())?,
        })
    }

    /// Headers for a request with the given body.
    ///
    /// Multipart bodies must not carry the default JSON content type, so it
    /// is dropped and reqwest supplies `multipart/form-data; boundary=…`.
    /// Entries in `extra` replace defaults with the same name.
    pub fn headers_for(&self, body: &RequestBody, extra: &HeaderMap) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        if matches!(body, RequestBody::Multipart(_)) {
            headers.remove(CONTENT_TYPE);
        }
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// Send one request and classify the response.
    ///
    /// # Errors
    /// * non-2xx status → the kind chosen by [`crate::ErrorKind::from_status`]
    /// * network failure or timeout → [`MiddlemanError::Connection`]
    /// * 2xx body that is not JSON → [`MiddlemanError::Validation`]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        extra_headers: &HeaderMap,
    ) -> Result<serde_json::Value, MiddlemanError> {
        let url = self.config.url(path);
        let headers = self.headers_for(&body, extra_headers);

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(upload) => request.multipart(upload.into_form()?),
        };

        debug!(%method, %url, "sending request");
        let started = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(&url, e))?;

        debug!(
            %method,
            %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "response received"
        );

        classify_response(status, &bytes)
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> MiddlemanError {
        if e.is_timeout() {
            MiddlemanError::connection(format!(
                "Request to '{url}' timed out after {}s",
                self.config.timeout_secs()
            ))
        } else if e.is_builder() {
            MiddlemanError::InvalidConfig(format!("Invalid request URL '{url}': {e}"))
        } else {
            MiddlemanError::connection(format!("Failed to reach '{url}': {e}"))
        }
    }
}

impl FileUpload {
    fn into_form(self) -> Result<Form, MiddlemanError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)
            .map_err(|e| MiddlemanError::validation(format!("Invalid MIME type '{}': {e}", self.mime)))?;
        Ok(Form::new().part(self.field, part))
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap, MiddlemanError> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
        MiddlemanError::InvalidConfig("API key contains characters not allowed in a header".into())
    })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Build the header map carrying an optional request id.
pub fn request_id_headers(request_id: Option<&str>) -> Result<HeaderMap, MiddlemanError> {
    let mut headers = HeaderMap::new();
    if let Some(id) = request_id {
        let value = HeaderValue::from_str(id)
            .map_err(|_| MiddlemanError::validation(format!("Invalid request id '{id}'")))?;
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    Ok(headers)
}

/// Turn a status code and raw body into the decoded payload or a typed error.
pub fn classify_response(status: u16, body: &[u8]) -> Result<serde_json::Value, MiddlemanError> {
    match MiddlemanError::from_status(status, remote_message(body)) {
        Some(err) => Err(err),
        None => serde_json::from_slice(body)
            .map_err(|_| MiddlemanError::validation("Invalid JSON response")),
    }
}

/// Extract a human-readable message from an error body, if it has one.
pub fn remote_message(body: &[u8]) -> Option<String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let message = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match (map.get("detail"), map.get("message")) {
            (Some(serde_json::Value::String(s)), _) => s.clone(),
            (_, Some(serde_json::Value::String(s))) => s.clone(),
            (Some(detail), _) => detail.to_string(),
            _ => serde_json::Value::Object(map).to_string(),
        },
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    Some(truncate_chars(message, MAX_REMOTE_MESSAGE_CHARS))
}

fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn transport() -> Transport {
        let config = ClientConfig::new("test_api_key").unwrap();
        Transport::new(&config).unwrap()
    }

    fn upload() -> RequestBody {
        RequestBody::Multipart(FileUpload {
            field: "pdf_file".into(),
            file_name: "doc.pdf".into(),
            mime: "application/pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        })
    }

    #[test]
    fn json_requests_carry_default_headers() {
        let t = transport();
        let h = t.headers_for(&RequestBody::Json(serde_json::json!({})), &HeaderMap::new());
        assert_eq!(h[AUTHORIZATION], "Bearer test_api_key");
        assert_eq!(h[CONTENT_TYPE], "application/json");
        assert!(h[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn multipart_requests_drop_json_content_type() {
        let t = transport();
        let h = t.headers_for(&upload(), &HeaderMap::new());
        assert!(h.get(CONTENT_TYPE).is_none());
        assert_eq!(h[AUTHORIZATION], "Bearer test_api_key");
    }

    #[test]
    fn extra_headers_are_merged() {
        let t = transport();
        let extra = request_id_headers(Some("req-42")).unwrap();
        let h = t.headers_for(&upload(), &extra);
        assert_eq!(h[REQUEST_ID_HEADER], "req-42");
        assert!(request_id_headers(None).unwrap().is_empty());
    }

    #[test]
    fn success_body_is_parsed() {
        let v = classify_response(200, br#"{"pdf_url":"https://example.com/test.pdf"}"#).unwrap();
        assert_eq!(v["pdf_url"], "https://example.com/test.pdf");
    }

    #[test]
    fn invalid_json_on_success_is_validation_error() {
        let err = classify_response(200, b"<html>oops</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Invalid JSON response");
    }

    #[test]
    fn status_codes_map_to_kinds() {
        for (status, kind) in [
            (402, ErrorKind::NotEnoughCredit),
            (401, ErrorKind::Forbidden),
            (403, ErrorKind::Forbidden),
            (404, ErrorKind::NotFound),
            (500, ErrorKind::Internal),
            (503, ErrorKind::Internal),
            (422, ErrorKind::Validation),
            (400, ErrorKind::Api),
        ] {
            let err = classify_response(status, b"").unwrap_err();
            assert_eq!(err.kind(), kind, "status {status}");
        }
    }

    #[test]
    fn remote_detail_is_embedded() {
        let err = classify_response(404, br#"{"detail":"Template not found"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Template not found");

        let body = br#"{"detail":[{"loc":["body","markdown"],"msg":"field required"}]}"#;
        let err = classify_response(422, body).unwrap_err();
        assert!(err.to_string().starts_with("Validation error: "));
        assert!(err.to_string().contains("field required"));
    }

    #[test]
    fn remote_message_shapes() {
        assert_eq!(remote_message(b""), None);
        assert_eq!(remote_message(b"  \n"), None);
        assert_eq!(remote_message(br#"{"message":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(remote_message(b"Bad Gateway\n").as_deref(), Some("Bad Gateway"));
        assert_eq!(remote_message(br#"{"code":7}"#).as_deref(), Some(r#"{"code":7}"#));

        let long = "x".repeat(2 * MAX_REMOTE_MESSAGE_CHARS);
        let msg = remote_message(long.as_bytes()).unwrap();
        assert_eq!(msg.chars().count(), MAX_REMOTE_MESSAGE_CHARS + 1);
    }
}
