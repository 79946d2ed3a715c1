//! Client side of the session service: typed HTTP client, session recovery and CLI parsing.

pub mod client;
pub mod commands;
pub mod error;
pub mod recovery;

pub use client::ApiClient;
pub use error::{ClientError, Result};
pub use recovery::{evaluate, recover, PollConfig, Recovery, StatusSource};
