//! Proteus REST API: session handling plus DNS and IP operations.
pub mod client;
pub mod dns;
pub mod ip;
pub mod properties;
pub mod types;

pub use client::{ProteusClient, Session};
