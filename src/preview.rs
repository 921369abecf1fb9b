//! Local file preview before upload.
//!
//! Images become an inline thumbnail (base64 data URL), everything else a
//! chip with name and size. Purely local: nothing here touches the network.

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::debug;

use crate::error::PortalError;
use crate::form::SelectedFile;
use crate::view::{Node, el, text};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Preview {
    Thumbnail { name: String, data_url: String },
    Chip { name: String, size: u64 },
}

impl Preview {
    /// Build the preview for `file`. Base64 encoding runs off the async
    /// executor since images can be several megabytes.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Render`] if the encoding task fails.
    pub async fn build(file: &SelectedFile) -> Result<Self, PortalError> {
        if !file.is_image() {
            return Ok(Self::Chip { name: file.name.clone(), size: file.size() });
        }
        let mime = file.mime.clone();
        let bytes = file.bytes.clone();
        let data_url = tokio::task::spawn_blocking(move || format!("data:{mime};base64,{}", B64.encode(bytes)))
            .await
            .map_err(|e| PortalError::Render(format!("thumbnail encoding failed: {e}")))?;
        Ok(Self::Thumbnail { name: file.name.clone(), data_url })
    }

    #[must_use]
    pub fn render(&self) -> Node {
        match self {
            Self::Thumbnail { name, data_url } => el("div")
                .class("file-preview")
                .child(el("img").class("img-thumbnail").attr("src", data_url.clone()).attr("alt", name.clone()))
                .into(),
            Self::Chip { name, size } => el("div")
                .class("file-preview")
                .child(
                    el("span")
                        .class("file-chip")
                        .child(el("span").class("file-name").text(name.clone()))
                        .child(text(" "))
                        .child(el("small").class("file-size").text(human_size(*size))),
                )
                .into(),
        }
    }
}

/// The designated preview area next to a file input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewSlot {
    content: Option<Preview>,
}

impl PreviewSlot {
    /// Show `file`, or clear the slot when the selection was cleared.
    ///
    /// # Errors
    ///
    /// Propagates thumbnail encoding failures; the slot is cleared first.
    pub async fn show(&mut self, file: Option<&SelectedFile>) -> Result<(), PortalError> {
        self.content = None;
        let Some(file) = file else {
            return Ok(());
        };
        let preview = Preview::build(file).await?;
        debug!(name = %file.name, mime = %file.mime, size = file.size(), "file preview ready");
        self.content = Some(preview);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    #[must_use]
    pub fn content(&self) -> Option<&Preview> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn render(&self) -> Node {
        self.content
            .as_ref()
            .map_or_else(|| Node::Fragment(Vec::new()), Preview::render)
    }
}

/// Read a file from disk as an upload selection.
///
/// # Errors
///
/// Returns [`PortalError::Io`] if the file cannot be read.
pub async fn read_selected_file(path: &Path) -> Result<SelectedFile, PortalError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
    let mime = guess_mime(&name).to_owned();
    Ok(SelectedFile { name, mime, bytes })
}

#[must_use]
pub fn guess_mime(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "zip" => "application/zip",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
