//! Diagnostico Core - Shared types library.
//!
//! This crate provides the types shared by the Diagnostico web application
//! and its tests:
//!
//! - Newtype IDs for the two persisted records (`UserId`, `DiagnosticId`)
//! - A validated [`Email`] address type
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is opt-in via the `postgres` feature.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
