//! Diagnosis submission route handler.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use diagnostico_core::Email;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::diagnosis::{self, Submission};
use crate::state::AppState;

/// Where a successful submission sends the browser.
const RESULTS_PATH: &str = "/results";

/// Diagnosis form data.
///
/// Every field is optional at the extraction layer so that a missing field
/// is reported as a validation error rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct DiagnoseForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
}

impl DiagnoseForm {
    /// Check that all fields are present and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingFields` if any field is absent or blank,
    /// `AppError::InvalidEmail` if the email does not parse.
    pub fn validate(self) -> Result<Submission> {
        let (Some(name), Some(email), Some(symptoms)) = (
            non_blank(self.name),
            non_blank(self.email),
            non_blank(self.symptoms),
        ) else {
            return Err(AppError::MissingFields);
        };

        Ok(Submission {
            name,
            email: Email::parse(&email)?,
            symptoms,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Submit symptoms for a diagnosis.
///
/// POST /diagnose
///
/// Stores the diagnostic and redirects to the results listing with
/// `302 Found`.
#[instrument(skip_all)]
pub async fn diagnose(
    State(state): State<AppState>,
    form: std::result::Result<Form<DiagnoseForm>, FormRejection>,
) -> Result<Response> {
    tracing::debug!("Starting diagnosis");

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable diagnosis form");
            DiagnoseForm::default()
        }
    };
    let submission = form.validate()?;

    diagnosis::submit(state.store(), state.encyclopedia(), &submission).await?;

    Ok((StatusCode::FOUND, [(LOCATION, RESULTS_PATH)]).into_response())
}
