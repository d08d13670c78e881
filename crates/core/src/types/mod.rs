//! Core types for Diagnostico.
//!
//! This module provides type-safe wrappers for the persisted domain concepts.

pub mod email;
pub mod id;

pub use email::{Email, EmailError};
pub use id::*;
