//! Clients for third-party HTTP APIs.

pub mod client;
