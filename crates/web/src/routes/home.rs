//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;

/// Landing page with the symptom form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate;

/// GET /
pub async fn index() -> HomeTemplate {
    HomeTemplate
}
