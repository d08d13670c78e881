//! The submit-diagnosis flow.
//!
//! 1. Find or create the user owning the submission (keyed by email).
//! 2. Search the encyclopedia for the symptoms and fetch up to
//!    [`MAX_ARTICLES`] candidate articles. Any lookup failure degrades to
//!    the fallback text; it never fails the submission.
//! 3. Store the lowercased symptoms with the composed diagnosis text.

use askama::Template;
use diagnostico_core::Email;
use thiserror::Error;
use tracing::instrument;

use super::encyclopedia::{Article, Encyclopedia};
use crate::db::{RepositoryError, Store};
use crate::models::{Diagnostic, NewDiagnostic, User};

/// Qualifier appended to the symptom text to steer the search toward
/// medical articles.
pub const SEARCH_QUALIFIER: &str = "enfermedad síntomas";

/// Number of candidate articles requested from the encyclopedia.
pub const MAX_ARTICLES: usize = 3;

/// Number of summary characters kept per article.
pub const SUMMARY_CHARS: usize = 200;

/// Prefix of the text stored when no article could be retrieved.
pub const FALLBACK_PREFIX: &str = "No se encontró información relacionada con: ";

/// Errors that abort a submission.
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to render diagnosis: {0}")]
    Render(#[from] askama::Error),
}

/// A validated submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub email: Email,
    /// Symptom text as the user typed it.
    pub symptoms: String,
}

/// Run the whole flow for one submission and return the stored diagnostic.
///
/// # Errors
///
/// Returns `DiagnosisError::Repository` if the store fails and
/// `DiagnosisError::Render` if the diagnosis text cannot be rendered.
/// Encyclopedia failures are absorbed into the fallback text.
#[instrument(skip_all, fields(email = %submission.email))]
pub async fn submit(
    store: &dyn Store,
    encyclopedia: &dyn Encyclopedia,
    submission: &Submission,
) -> Result<Diagnostic, DiagnosisError> {
    tracing::debug!("Saving user");
    let user = find_or_create_user(store, &submission.name, &submission.email).await?;

    tracing::debug!("Looking up symptoms in the encyclopedia");
    let articles = lookup_articles(encyclopedia, &build_search_query(&submission.symptoms)).await;
    let diagnosis = compose_diagnosis(&articles, &submission.symptoms)?;

    tracing::debug!(articles = articles.len(), "Saving diagnostic");
    let diagnostic = store
        .create_diagnostic(&NewDiagnostic {
            user_id: user.id,
            symptoms: submission.symptoms.to_lowercase(),
            diagnosis,
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        diagnostic_id = %diagnostic.id,
        "Diagnostic stored"
    );
    Ok(diagnostic)
}

/// Return the user registered under `email`, creating it if needed.
///
/// A concurrent submission may insert the same email between the lookup and
/// the insert; the unique constraint rejects ours and the winner is re-read.
async fn find_or_create_user(
    store: &dyn Store,
    name: &str,
    email: &Email,
) -> Result<User, RepositoryError> {
    if let Some(user) = store.find_user_by_email(email).await? {
        return Ok(user);
    }

    match store.create_user(name, email).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User created");
            Ok(user)
        }
        Err(RepositoryError::Conflict(_)) => store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| RepositoryError::Conflict("email already exists".to_owned())),
        Err(e) => Err(e),
    }
}

/// Build the encyclopedia query for a symptom description.
#[must_use]
pub fn build_search_query(symptoms: &str) -> String {
    format!("{symptoms} {SEARCH_QUALIFIER}")
}

/// Search and fetch candidate articles.
///
/// A failed search yields no articles; a failed fetch drops that candidate.
pub async fn lookup_articles(encyclopedia: &dyn Encyclopedia, query: &str) -> Vec<Article> {
    let titles = match encyclopedia.search(query, MAX_ARTICLES).await {
        Ok(titles) => titles,
        Err(e) => {
            tracing::error!(error = %e, "Encyclopedia search failed");
            return Vec::new();
        }
    };

    let mut articles = Vec::with_capacity(titles.len());
    for title in titles.iter().take(MAX_ARTICLES) {
        if let Some(article) = fetch_article(encyclopedia, title).await {
            articles.push(article);
        }
    }
    articles
}

async fn fetch_article(encyclopedia: &dyn Encyclopedia, title: &str) -> Option<Article> {
    encyclopedia
        .article(title)
        .await
        .inspect_err(|e| tracing::warn!(title, error = %e, "Skipping article"))
        .ok()
}

/// HTML fragment stored as the diagnosis. Every interpolated value is
/// escaped by the template, including the fallback symptoms.
#[derive(Template)]
#[template(path = "fragments/diagnosis.html")]
struct DiagnosisFragment<'a> {
    articles: Vec<Excerpt<'a>>,
    fallback_prefix: &'static str,
    symptoms: &'a str,
}

struct Excerpt<'a> {
    title: &'a str,
    url: &'a str,
    summary: &'a str,
}

/// Compose the stored diagnosis text.
///
/// Each article becomes a linked heading followed by the first
/// [`SUMMARY_CHARS`] characters of its summary. With no articles the result
/// is the fallback message naming the submitted symptoms.
///
/// # Errors
///
/// Returns `askama::Error` if the fragment fails to render.
pub fn compose_diagnosis(articles: &[Article], symptoms: &str) -> Result<String, askama::Error> {
    let articles = articles
        .iter()
        .map(|article| Excerpt {
            title: &article.title,
            url: &article.url,
            summary: truncate_chars(&article.summary, SUMMARY_CHARS),
        })
        .collect();

    DiagnosisFragment {
        articles,
        fallback_prefix: FALLBACK_PREFIX,
        symptoms,
    }
    .render()
}

/// The first `max` characters of `s`.
fn truncate_chars(s: &str, max: usize) -> &str {
    s.char_indices()
        .nth(max)
        .and_then(|(end, _)| s.get(..end))
        .unwrap_or(s)
}
