//! Results listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::models::DiagnosticEntry;
use crate::state::AppState;

/// Every stored diagnostic with its owner.
#[derive(Template, WebTemplate)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub entries: Vec<DiagnosticEntry>,
}

/// GET /results
///
/// Lists all diagnostics in storage order. No filtering or pagination.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<ResultsTemplate> {
    let entries = state.store().list_diagnostics().await?;
    tracing::debug!(count = entries.len(), "Listing diagnostics");
    Ok(ResultsTemplate { entries })
}
