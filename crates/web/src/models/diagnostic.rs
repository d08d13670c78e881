//! Diagnostic domain types.

use diagnostico_core::{DiagnosticId, Email, UserId};

/// A stored pairing of a user's reported symptoms with the informational
/// text composed for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    /// Owner; always references an existing user.
    pub user_id: UserId,
    /// Symptom text, lowercased before storage.
    pub symptoms: String,
    /// HTML article summary, or the fallback message when nothing was found.
    pub diagnosis: String,
}

/// Input for inserting a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiagnostic {
    pub user_id: UserId,
    pub symptoms: String,
    pub diagnosis: String,
}

/// A diagnostic joined with its owner, as listed on the results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub diagnostic: Diagnostic,
    pub user_name: String,
    pub user_email: Email,
}
