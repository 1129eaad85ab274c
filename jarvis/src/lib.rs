//! Jarvis - personal information management client
//!
//! Jarvis keeps log entries, tags and events behind a small HTTP API. This
//! crate is the command-line client for it: records are edited as plain text
//! in the user's editor, submitted to the API, and browsed as summaries and
//! tables.
//!
//! # Modules
//!
//! - [`record`] - Record type, per-kind field schemas and event categories
//! - [`codec`] - Text form of a record (metadata lines, blank line, body)
//! - [`api`] - HTTP transport, resource client, pagination, tag auto-creation
//! - [`format`] - Log summaries, search windows and tables
//! - [`editor`] - Editing buffers and the external editor
//! - [`prompt`] - Interactive questions
//! - [`config`] - Config file with named environments
//! - [`admin`] - Snapshots and migration between environments
//! - [`commands`] - One function per subcommand
//! - [`cli`] - Command-line interface

pub mod admin;
pub mod api;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod editor;
pub mod format;
pub mod prompt;
pub mod record;

pub use api::{ApiClient, ApiError};
pub use config::{Config, Profile};
pub use record::{Record, ResourceKind};
