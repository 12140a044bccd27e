//! Terminal client for a chat-completion model.
//!
//! Each invocation restores the conversation for the current terminal
//! session, applies one turn, and persists it again. See [`session`] for the
//! conversation entity and [`dispatch`] for how command-line flags select
//! what happens.

pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod providers;
pub mod session;
pub mod shell;
pub mod stdin;

pub use config::{Config, ConfigError};
pub use dispatch::{Dispatcher, Intent};
pub use session::ChatSession;
