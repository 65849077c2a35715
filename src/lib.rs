//! Conversational assistant over a local SQLite ride-sharing store.
//!
//! Questions are classified, turned into SQL or a schema/PII answer by a
//! chat-completion endpoint, and rendered in a terminal shell.

pub mod ai_sql;
pub mod backslash_commands;
pub mod cli;
pub mod config;
pub mod database;
pub mod database_sqlite;
pub mod format;
pub mod logging;
pub mod prompt;
pub mod seed;

pub use config::Config;
