//! In-memory collaborators for handler and service tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use diagnostico_core::{DiagnosticId, Email, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{Diagnostic, DiagnosticEntry, NewDiagnostic, User};
use crate::services::encyclopedia::{Article, Encyclopedia, EncyclopediaError};

/// Build an article whose URL is derived from its title.
pub fn article(title: &str, summary: &str) -> Article {
    Article {
        title: title.to_string(),
        url: format!("https://es.wikipedia.org/wiki/{}", title.replace(' ', "_")),
        summary: summary.to_string(),
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
struct MemoryInner {
    users: Vec<User>,
    diagnostics: Vec<Diagnostic>,
    /// A user inserted by a "concurrent" request: invisible to the first
    /// lookup, it materialises when our insert collides with it.
    hidden_user: Option<(String, Email)>,
}

/// [`Store`] kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    unavailable: bool,
}

impl MemoryStore {
    /// A store whose every call fails like an unreachable database.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Simulate another request inserting `email` between our lookup and insert.
    pub fn with_hidden_user(self, name: &str, email: &str) -> Self {
        self.inner.lock().unwrap().hidden_user =
            Some((name.to_string(), Email::parse(email).unwrap()));
        self
    }

    pub fn users(&self) -> Vec<User> {
        self.inner.lock().unwrap().users.clone()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.lock().unwrap().diagnostics.clone()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.unavailable {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn next_id(len: usize) -> i32 {
    i32::try_from(len).unwrap() + 1
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| &u.email == email).cloned())
    }

    async fn create_user(&self, name: &str, email: &Email) -> Result<User, RepositoryError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();

        if let Some((hidden_name, hidden_email)) = inner.hidden_user.take() {
            let user = User {
                id: UserId::new(next_id(inner.users.len())),
                name: hidden_name,
                email: hidden_email,
            };
            inner.users.push(user);
        }

        if inner.users.iter().any(|u| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = User {
            id: UserId::new(next_id(inner.users.len())),
            name: name.to_string(),
            email: email.clone(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn create_diagnostic(
        &self,
        new: &NewDiagnostic,
    ) -> Result<Diagnostic, RepositoryError> {
        self.check()?;
        let mut inner = self.inner.lock().unwrap();

        if !inner.users.iter().any(|u| u.id == new.user_id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} does not exist",
                new.user_id
            )));
        }

        let diagnostic = Diagnostic {
            id: DiagnosticId::new(next_id(inner.diagnostics.len())),
            user_id: new.user_id,
            symptoms: new.symptoms.clone(),
            diagnosis: new.diagnosis.clone(),
        };
        inner.diagnostics.push(diagnostic.clone());
        Ok(diagnostic)
    }

    async fn list_diagnostics(&self) -> Result<Vec<DiagnosticEntry>, RepositoryError> {
        self.check()?;
        let inner = self.inner.lock().unwrap();

        Ok(inner
            .diagnostics
            .iter()
            .map(|d| {
                let owner = inner.users.iter().find(|u| u.id == d.user_id).unwrap();
                DiagnosticEntry {
                    diagnostic: d.clone(),
                    user_name: owner.name.clone(),
                    user_email: owner.email.clone(),
                }
            })
            .collect())
    }
}

// =============================================================================
// Encyclopedia
// =============================================================================

/// Scripted [`Encyclopedia`].
///
/// Search returns the configured titles (or every known article's title),
/// and only known articles can be fetched.
#[derive(Default)]
pub struct StubEncyclopedia {
    articles: Vec<Article>,
    titles: Option<Vec<String>>,
    fail_search: bool,
    searches: Mutex<Vec<(String, usize)>>,
}

impl StubEncyclopedia {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles,
            ..Self::default()
        }
    }

    /// An encyclopedia whose search always fails.
    pub fn failing() -> Self {
        Self {
            fail_search: true,
            ..Self::default()
        }
    }

    /// Override the titles returned by search.
    pub fn with_titles(mut self, titles: &[&str]) -> Self {
        self.titles = Some(titles.iter().map(ToString::to_string).collect());
        self
    }

    /// Every `(query, limit)` search received so far.
    pub fn searches(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encyclopedia for StubEncyclopedia {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, EncyclopediaError> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), limit));

        if self.fail_search {
            return Err(EncyclopediaError::Api {
                code: "unavailable".to_string(),
                info: "stubbed outage".to_string(),
            });
        }

        let titles = self
            .titles
            .clone()
            .unwrap_or_else(|| self.articles.iter().map(|a| a.title.clone()).collect());
        Ok(titles.into_iter().take(limit).collect())
    }

    async fn article(&self, title: &str) -> Result<Article, EncyclopediaError> {
        self.articles
            .iter()
            .find(|a| a.title == title)
            .cloned()
            .ok_or_else(|| EncyclopediaError::NotFound(title.to_string()))
    }
}
