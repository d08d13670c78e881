//! Diagnostico web application library.
//!
//! Collects user-reported symptoms, looks them up on Wikipedia, stores the
//! composed summary in `PostgreSQL`, and renders it back. The binary in
//! `main.rs` wires these modules together; keeping them in a library lets
//! the router be exercised in tests against in-memory collaborators.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
