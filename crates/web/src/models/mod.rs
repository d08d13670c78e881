//! Domain models for Diagnostico.
//!
//! These types represent validated domain objects separate from database row
//! types.

pub mod diagnostic;
pub mod user;

pub use diagnostic::{Diagnostic, DiagnosticEntry, NewDiagnostic};
pub use user::User;
