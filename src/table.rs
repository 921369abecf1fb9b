//! Table rendering for resource collections.
//!
//! DESIGN
//! ======
//! A [`TableSpec`] lists the visible columns and row actions of a resource.
//! `render_body` rebuilds the whole `<tbody>` from the item list; there is no
//! incremental patching. An empty list yields exactly one placeholder row.

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::warn;

use crate::error::PortalError;
use crate::preview::human_size;
use crate::record::Record;
use crate::view::{Element, Node, el, text};

pub const EMPTY_PLACEHOLDER: &str = "暂无数据";
pub const PLACEHOLDER_CLASS: &str = "placeholder";

// =============================================================================
// COLUMNS
// =============================================================================

/// Maps one stored value to a badge label and style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeVariant {
    pub value: &'static str,
    pub label: &'static str,
    pub class: &'static str,
}

pub type CellRenderer = fn(&Record) -> Result<Node, PortalError>;

#[derive(Clone, Debug)]
pub enum Column {
    Text { header: &'static str, field: &'static str },
    /// RFC 3339 or `YYYY-MM-DD…` values shown as the calendar date.
    Date { header: &'static str, field: &'static str },
    Badge { header: &'static str, field: &'static str, variants: &'static [BadgeVariant] },
    /// Byte counts shown as B/KB/MB.
    FileSize { header: &'static str, field: &'static str },
    Custom { header: &'static str, render: CellRenderer },
}

impl Column {
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            Self::Text { header, .. }
            | Self::Date { header, .. }
            | Self::Badge { header, .. }
            | Self::FileSize { header, .. }
            | Self::Custom { header, .. } => *header,
        }
    }

    /// The record field backing this column, if it maps to exactly one.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Text { field, .. } | Self::Date { field, .. } | Self::Badge { field, .. } | Self::FileSize { field, .. } => {
                Some(*field)
            }
            Self::Custom { .. } => None,
        }
    }

    fn cell(&self, record: &Record) -> Result<Node, PortalError> {
        let content = match self {
            Self::Text { field, .. } => text(record.text(field)),
            Self::Date { field, .. } => text(format_date(&record.text(field))),
            Self::Badge { field, variants, .. } => badge(&record.text(field), variants),
            Self::FileSize { field, .. } => match record.get(field).and_then(serde_json::Value::as_u64) {
                Some(bytes) => text(human_size(bytes)),
                None => text(record.text(field)),
            },
            Self::Custom { render, .. } => render(record)?,
        };
        Ok(el("td").child(content).into())
    }
}

fn badge(value: &str, variants: &[BadgeVariant]) -> Node {
    match variants.iter().find(|v| v.value == value) {
        Some(v) => el("span").class(format!("badge {}", v.class)).text(v.label).into(),
        None => el("span").class("badge bg-light text-dark").text(value).into(),
    }
}

/// Reduce a timestamp to its date part; unparsable input is shown as-is.
#[must_use]
pub fn format_date(raw: &str) -> String {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return ts.date().to_string();
    }
    let head = raw.get(..10).unwrap_or(raw);
    match Date::parse(head, format_description!("[year]-[month]-[day]")) {
        Ok(date) => date.to_string(),
        Err(_) => raw.to_owned(),
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Edit,
    Delete,
    Download,
    View,
}

impl ActionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Download => "download",
            Self::View => "view",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            "download" => Some(Self::Download),
            "view" => Some(Self::View),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Edit => "编辑",
            Self::Delete => "删除",
            Self::Download => "下载",
            Self::View => "查看",
        }
    }

    fn button_class(self) -> &'static str {
        match self {
            Self::Edit => "btn btn-sm btn-outline-primary",
            Self::Delete => "btn btn-sm btn-outline-danger",
            Self::Download => "btn btn-sm btn-outline-success",
            Self::View => "btn btn-sm btn-outline-secondary",
        }
    }
}

// =============================================================================
// TABLE
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct TableSpec {
    pub columns: Vec<Column>,
    pub actions: Vec<ActionKind>,
}

impl TableSpec {
    #[must_use]
    pub fn new(columns: Vec<Column>, actions: Vec<ActionKind>) -> Self {
        Self { columns, actions }
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len() + usize::from(!self.actions.is_empty())
    }

    #[must_use]
    pub fn header(&self) -> Node {
        let mut row = el("tr").children(self.columns.iter().map(|c| el("th").text(c.header()).into()));
        if !self.actions.is_empty() {
            row = row.child(el("th").text("操作"));
        }
        el("thead").child(row).into()
    }

    /// Build the full `<tbody>` for `items`.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Render`] if a custom cell renderer fails; no
    /// partial body is produced.
    pub fn render_body(&self, items: &[Record]) -> Result<Node, PortalError> {
        if items.is_empty() {
            let colspan = self.column_count().max(1).to_string();
            let placeholder = el("tr")
                .class(PLACEHOLDER_CLASS)
                .child(el("td").attr("colspan", colspan).class("text-center text-muted").text(EMPTY_PLACEHOLDER));
            return Ok(el("tbody").child(placeholder).into());
        }

        let rows = items
            .iter()
            .map(|record| self.render_row(record))
            .collect::<Result<Vec<Node>, PortalError>>()?;
        Ok(el("tbody").children(rows).into())
    }

    fn render_row(&self, record: &Record) -> Result<Node, PortalError> {
        let id = record.id();
        let mut row = el("tr");
        if let Some(id) = &id {
            row = row.attr("data-id", id.to_string());
        }
        for column in &self.columns {
            row = row.child(column.cell(record).map_err(into_render_error)?);
        }
        if self.actions.is_empty() {
            return Ok(row.into());
        }

        let mut cell = el("td").class("actions");
        match &id {
            Some(id) => {
                for action in &self.actions {
                    cell = cell.child(action_button(*action, &id.to_string()));
                }
            }
            None => warn!("record without id rendered without actions"),
        }
        Ok(row.child(cell).into())
    }
}

fn action_button(action: ActionKind, id: &str) -> Element {
    el("button")
        .attr("type", "button")
        .class(action.button_class())
        .attr("data-action", action.as_str())
        .attr("data-id", id)
        .text(action.label())
}

fn into_render_error(err: PortalError) -> PortalError {
    match err {
        PortalError::Render(_) => err,
        other => PortalError::Render(other.to_string()),
    }
}
