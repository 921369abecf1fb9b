//! Transport seam between controllers and the portal's REST endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every resource exposes the same shape under its endpoint:
//! `GET {base}`, `GET/PUT/DELETE {base}/{id}`, `POST {base}`,
//! `GET {base}/export`, plus `{base}/{id}/view|download` links that the
//! browser opens directly. [`ResourceTransport`] is that contract;
//! [`http::HttpTransport`] is the real client and tests supply mocks.

pub mod http;

use async_trait::async_trait;

use crate::error::PortalError;
use crate::export::ExportFormat;
use crate::form::FormData;
use crate::record::{Record, RecordId};

pub use http::HttpTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileAction {
    View,
    Download,
}

impl FileAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Download => "download",
        }
    }
}

#[must_use]
pub fn item_path(endpoint: &str, id: &RecordId) -> String {
    format!("{}/{id}", endpoint.trim_end_matches('/'))
}

#[must_use]
pub fn file_path(endpoint: &str, id: &RecordId, action: FileAction) -> String {
    format!("{}/{}", item_path(endpoint, id), action.as_str())
}

#[must_use]
pub fn export_path(endpoint: &str, format: ExportFormat) -> String {
    format!("{}/export?format={}", endpoint.trim_end_matches('/'), format.extension())
}

/// Async access to one portal server. Enables mocking in tests.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    /// `GET {endpoint}`.
    ///
    /// # Errors
    ///
    /// [`PortalError::Network`], [`PortalError::Http`] or [`PortalError::Decode`].
    async fn list(&self, endpoint: &str) -> Result<Vec<Record>, PortalError>;

    /// `GET {endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// As for [`ResourceTransport::list`].
    async fn fetch(&self, endpoint: &str, id: &RecordId) -> Result<Record, PortalError>;

    /// `POST {endpoint}`; multipart when the form carries a file.
    ///
    /// # Errors
    ///
    /// As for [`ResourceTransport::list`].
    async fn create(&self, endpoint: &str, form: &FormData) -> Result<Option<Record>, PortalError>;

    /// `PUT {endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// As for [`ResourceTransport::list`].
    async fn update(&self, endpoint: &str, id: &RecordId, form: &FormData) -> Result<Option<Record>, PortalError>;

    /// `DELETE {endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// [`PortalError::Network`] or [`PortalError::Http`].
    async fn delete(&self, endpoint: &str, id: &RecordId) -> Result<(), PortalError>;

    /// `GET {endpoint}/export`; the server-rendered file.
    ///
    /// # Errors
    ///
    /// [`PortalError::Network`] or [`PortalError::Http`].
    async fn export(&self, endpoint: &str, format: ExportFormat) -> Result<Vec<u8>, PortalError>;

    /// Link for opening a record's file in a new browsing context.
    fn file_url(&self, endpoint: &str, id: &RecordId, action: FileAction) -> String {
        file_path(endpoint, id, action)
    }
}
