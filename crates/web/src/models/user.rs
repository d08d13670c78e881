//! User domain type.

use diagnostico_core::{Email, UserId};

/// A person who submitted at least one diagnosis request.
///
/// Created lazily on the first submission for an email and never updated
/// afterwards, so a returning user keeps the name they first gave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name as first submitted.
    pub name: String,
    /// Email address (unique across users).
    pub email: Email,
}
