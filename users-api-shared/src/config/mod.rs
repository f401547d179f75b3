//! # Configuration
//!
//! Process-level settings for the users-api server: listen port, database
//! connection and pool policy, timeouts, and logging.

pub mod server;
