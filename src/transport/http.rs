//! `reqwest` implementation of [`ResourceTransport`].
//!
//! Response parsing lives in free functions (`decode_*`, `error_message`)
//! so it can be tested without a server.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{FileAction, ResourceTransport, export_path, file_path, item_path};
use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::export::ExportFormat;
use crate::form::FormData;
use crate::record::{Envelope, Record, RecordId};

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a client carrying the session cookie and configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Config`] if the cookie is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = &config.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| PortalError::Config(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| PortalError::Config(format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(u16, String), PortalError> {
        let response = request
            .send()
            .await
            .map_err(|e| PortalError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PortalError::Network(e.to_string()))?;
        debug!(status, bytes = body.len(), "response received");

        if !(200..300).contains(&status) {
            return Err(PortalError::Http { status, message: error_message(status, &body) });
        }
        Ok((status, body))
    }

    fn with_form(request: RequestBuilder, form: &FormData) -> Result<RequestBuilder, PortalError> {
        if form.file().is_some() {
            Ok(request.multipart(multipart_form(form)?))
        } else {
            Ok(request.json(&form.to_json()))
        }
    }
}

#[async_trait]
impl ResourceTransport for HttpTransport {
    #[instrument(skip(self))]
    async fn list(&self, endpoint: &str) -> Result<Vec<Record>, PortalError> {
        let (status, body) = self.send(self.http.get(self.url(endpoint))).await?;
        decode_list(status, &body)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, endpoint: &str, id: &RecordId) -> Result<Record, PortalError> {
        let (status, body) = self.send(self.http.get(self.url(&item_path(endpoint, id)))).await?;
        decode_record(status, &body)
    }

    #[instrument(skip(self, form))]
    async fn create(&self, endpoint: &str, form: &FormData) -> Result<Option<Record>, PortalError> {
        let request = Self::with_form(self.http.post(self.url(endpoint)), form)?;
        let (status, body) = self.send(request).await?;
        decode_optional_record(status, &body)
    }

    #[instrument(skip(self, form))]
    async fn update(&self, endpoint: &str, id: &RecordId, form: &FormData) -> Result<Option<Record>, PortalError> {
        let request = Self::with_form(self.http.put(self.url(&item_path(endpoint, id))), form)?;
        let (status, body) = self.send(request).await?;
        decode_optional_record(status, &body)
    }

    #[instrument(skip(self))]
    async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<(), PortalError> {
        let (status, body) = self.send(self.http.delete(self.url(&item_path(endpoint, id)))).await?;
        // A 2xx can still carry `{success: false}`.
        if let Ok(envelope) = serde_json::from_str::<Envelope<Value>>(&body) {
            envelope.into_result(status)?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn export(&self, endpoint: &str, format: ExportFormat) -> Result<Vec<u8>, PortalError> {
        let response = self
            .http
            .get(self.url(&export_path(endpoint, format)))
            .header(ACCEPT, format.mime())
            .send()
            .await
            .map_err(|e| PortalError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortalError::Http { status, message: error_message(status, &body) });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortalError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn file_url(&self, endpoint: &str, id: &RecordId, action: FileAction) -> String {
        self.url(&file_path(endpoint, id, action))
    }
}

fn multipart_form(form: &FormData) -> Result<Form, PortalError> {
    let mut body = Form::new();
    for (key, value) in form.fields() {
        body = body.text(key.to_owned(), value.to_owned());
    }
    if let Some((field, file)) = form.file() {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| PortalError::Validation(format!("invalid file type `{}`: {e}", file.mime)))?;
        body = body.part(field.to_owned(), part);
    }
    Ok(body)
}

// =============================================================================
// PARSING
// =============================================================================

/// Decode a collection from either a bare array or a `{success, data}` wrapper.
///
/// # Errors
///
/// [`PortalError::Decode`] for malformed bodies, [`PortalError::Http`] for
/// `success: false`.
pub fn decode_list(status: u16, body: &str) -> Result<Vec<Record>, PortalError> {
    let envelope: Envelope<Vec<Record>> = serde_json::from_str(body)?;
    Ok(envelope.into_result(status)?.unwrap_or_default())
}

/// Decode a single record; a wrapper without `data` is an error.
///
/// # Errors
///
/// As for [`decode_list`], plus a missing record.
pub fn decode_record(status: u16, body: &str) -> Result<Record, PortalError> {
    let envelope: Envelope<Record> = serde_json::from_str(body)?;
    envelope
        .into_result(status)?
        .ok_or_else(|| PortalError::Decode("response carried no record".into()))
}

/// Decode the body of a create/update. Servers may answer with the record,
/// a bare acknowledgement, or nothing at all.
///
/// # Errors
///
/// [`PortalError::Http`] when the body says `success: false`.
pub fn decode_optional_record(status: u16, body: &str) -> Result<Option<Record>, PortalError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Envelope<Record>>(body) {
        Ok(envelope) => envelope.into_result(status),
        Err(e) => {
            debug!(error = %e, "mutation response was not a record");
            Ok(None)
        }
    }
}

/// User-facing message for a failed response: body `error`, then body
/// `message`, then the status text.
#[must_use]
pub fn error_message(status: u16, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(ToOwned::to_owned))
            .filter(|m| !m.trim().is_empty())
    });
    from_body.unwrap_or_else(|| {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map_or_else(|| format!("HTTP {status}"), ToOwned::to_owned)
    })
}
