//! External articles API connectivity check.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::services::articles::{self, ArticlesPreview};
use crate::state::AppState;

/// GET /test_api
///
/// Returns the upstream status and its first five articles, or a 500 JSON
/// error if the upstream is unreachable or returns something other than a
/// JSON array.
#[instrument(skip(state))]
pub async fn test_api(State(state): State<AppState>) -> Result<Json<ArticlesPreview>> {
    let preview = articles::probe(state.http(), &state.config().articles_api_url).await?;
    Ok(Json(preview))
}
