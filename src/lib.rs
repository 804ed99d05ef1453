//! Crate entrypoint wiring together configuration, the Proteus session, and the DNS/IP operations.

pub mod config;
pub mod error;
pub mod mapping;
pub mod proteus;
pub mod validation;

pub use error::{ProteusError, Result};
pub use proteus::{ProteusClient, Session};
