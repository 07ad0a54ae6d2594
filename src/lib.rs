//! # Hallpass
//!
//! Authorization and group management for a chat bot: who belongs to which
//! group, which groups administer which, which commands a group may run, and
//! the per-repository autolabel and priority tables the bot's webhooks read.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! hallpass = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hallpass::config::Authority;
//! use hallpass::store::{SqliteStore, Store};
//! use hallpass::warden::Warden;
//!
//! let store = SqliteStore::new("./data/hallpass.db").unwrap();
//! store.initialize().unwrap();
//!
//! let warden = Warden::new(
//!     Arc::new(store),
//!     Authority::with_override(354515),
//!     Duration::from_secs(5),
//! );
//! if !warden.is_allowed(user_id, "autolabel add")? {
//!     // refuse
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `hallpass` binary. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod rules;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;
pub mod warden;
