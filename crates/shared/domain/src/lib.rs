//! # Domain Models
//!
//! Plain data shared by the service crates: configuration and the JSON shapes of the HTTP
//! API. Only `serde`; no I/O, no storage logic.

pub mod config;
pub mod models;
