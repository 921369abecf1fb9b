//! clubdesk: client core for the club administration portal.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every department page (vendors, designs, meetings, activities, plans,
//! details, users, departments) follows the same fetch → render → act →
//! reload cycle. [`controller::ResourceListController`] implements that cycle
//! once; [`resources`] describes each page's endpoint, columns and form rules.
//!
//! The controller talks to the server through [`transport::ResourceTransport`],
//! renders through the escaping view tree in [`view`], and reports through the
//! injected [`notify::Notifier`].

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod form;
pub mod notify;
pub mod preview;
pub mod record;
pub mod resources;
pub mod table;
pub mod transport;
pub mod view;

pub use config::PortalConfig;
pub use controller::ResourceListController;
pub use error::PortalError;
pub use record::{Record, RecordId};
pub use resources::ResourceSpec;
