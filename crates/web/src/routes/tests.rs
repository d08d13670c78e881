//! Router-level tests driving the full middleware stack.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION},
    },
    response::Response,
    routing::get,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

use super::router;
use crate::config::{AppConfig, DEFAULT_ARTICLES_API_URL};
use crate::services::diagnosis::FALLBACK_PREFIX;
use crate::state::AppState;
use crate::test_support::{MemoryStore, StubEncyclopedia, article};

struct TestApp {
    store: Arc<MemoryStore>,
    encyclopedia: Arc<StubEncyclopedia>,
    articles_api_url: Url,
}

impl TestApp {
    fn new(store: MemoryStore, encyclopedia: StubEncyclopedia) -> Self {
        Self {
            store: Arc::new(store),
            encyclopedia: Arc::new(encyclopedia),
            articles_api_url: Url::parse(DEFAULT_ARTICLES_API_URL).unwrap(),
        }
    }

    fn with_articles_api(mut self, url: Url) -> Self {
        self.articles_api_url = url;
        self
    }

    fn router(&self) -> Router {
        let config = AppConfig {
            database_url: SecretString::from("postgres://localhost/diagnostico_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            wikipedia_language: "es".to_string(),
            articles_api_url: self.articles_api_url.clone(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let http = reqwest::Client::builder().no_proxy().build().unwrap();

        router(AppState::new(
            config,
            self.store.clone(),
            self.encyclopedia.clone(),
            http,
        ))
    }

    async fn get(&self, uri: &str) -> Response {
        self.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(&self, body: &str) -> Response {
        self.router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/diagnose")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Serve `upstream` on an ephemeral local port and return its articles URL.
async fn spawn_upstream(upstream: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/api/articles.json")).unwrap()
}

fn eight_articles() -> Value {
    Value::Array(
        (1..=8)
            .map(|i| json!({"title": format!("Artículo {i}"), "url": format!("/articulo-{i}")}))
            .collect(),
    )
}

// =============================================================================
// POST /diagnose
// =============================================================================

#[tokio::test]
async fn test_diagnose_new_email_creates_user_and_diagnostic() {
    let app = TestApp::new(
        MemoryStore::default(),
        StubEncyclopedia::with_articles(vec![article("Gripe", "Enfermedad infecciosa.")]),
    );

    let response = app
        .post_form("name=Ana&email=ana%40example.com&symptoms=Fiebre+y+tos")
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/results");

    let users = app.store.users();
    let diagnostics = app.store.diagnostics();
    assert_eq!(users.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(users[0].name, "Ana");
    assert_eq!(diagnostics[0].user_id, users[0].id);
    assert_eq!(diagnostics[0].symptoms, "fiebre y tos");
}

#[tokio::test]
async fn test_diagnose_existing_email_reuses_user() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    app.post_form("name=Ana&email=ana%40example.com&symptoms=tos")
        .await;
    let response = app
        .post_form("name=Otra&email=ana%40example.com&symptoms=fiebre")
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let users = app.store.users();
    let diagnostics = app.store.diagnostics();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Ana");
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.user_id == users[0].id));
}

#[tokio::test]
async fn test_diagnose_missing_fields_is_bad_request() {
    let bodies = [
        "email=ana%40example.com&symptoms=tos",
        "name=Ana&symptoms=tos",
        "name=Ana&email=ana%40example.com",
        "name=&email=ana%40example.com&symptoms=tos",
        "name=Ana&email=ana%40example.com&symptoms=+++",
        "",
    ];

    for body in bodies {
        let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());
        let response = app.post_form(body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(
            body_json(response).await,
            json!({"error": "Todos los campos son requeridos"})
        );
        assert!(app.store.users().is_empty());
        assert!(app.store.diagnostics().is_empty());
        assert!(app.encyclopedia.searches().is_empty());
    }
}

#[tokio::test]
async fn test_diagnose_without_form_body_is_bad_request() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    let response = app
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/diagnose")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.users().is_empty());
}

#[tokio::test]
async fn test_diagnose_malformed_email_is_bad_request() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    let response = app
        .post_form("name=Ana&email=ana.example.com&symptoms=tos")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Correo electrónico inválido");
    assert_eq!(body["details"], "email must contain an @ symbol");
    assert!(app.store.users().is_empty());
}

#[tokio::test]
async fn test_diagnose_without_results_stores_fallback() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    app.post_form("name=Ana&email=ana%40example.com&symptoms=Dolor+de+Cabeza")
        .await;

    let diagnostics = app.store.diagnostics();
    assert_eq!(
        diagnostics[0].diagnosis,
        "No se encontró información relacionada con: Dolor de Cabeza"
    );
}

#[tokio::test]
async fn test_diagnose_survives_encyclopedia_outage() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::failing());

    let response = app
        .post_form("name=Ana&email=ana%40example.com&symptoms=mareo")
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(app.store.diagnostics()[0].diagnosis, format!("{FALLBACK_PREFIX}mareo"));
}

#[tokio::test]
async fn test_diagnose_when_every_fetch_fails_stores_fallback() {
    let app = TestApp::new(
        MemoryStore::default(),
        StubEncyclopedia::default().with_titles(&["Fantasma", "Otro fantasma"]),
    );

    app.post_form("name=Ana&email=ana%40example.com&symptoms=mareo")
        .await;

    assert_eq!(app.store.diagnostics()[0].diagnosis, format!("{FALLBACK_PREFIX}mareo"));
}

#[tokio::test]
async fn test_diagnose_with_results_stores_linked_summary() {
    let summary = "La migraña es una enfermedad caracterizada por episodios de cefalea. ".repeat(6);
    let app = TestApp::new(
        MemoryStore::default(),
        StubEncyclopedia::with_articles(vec![article("Migraña", &summary)]),
    );

    app.post_form("name=Ana&email=ana%40example.com&symptoms=dolor+de+cabeza")
        .await;

    let diagnostics = app.store.diagnostics();
    let diagnosis = &diagnostics[0].diagnosis;
    let prefix: String = summary.chars().take(200).collect();
    assert!(diagnosis.starts_with("<h4><a href='https:"));
    assert!(diagnosis.contains("target='_blank' rel='noopener'>Migraña</a></h4>"));
    assert!(diagnosis.contains(&format!("<p>{prefix}...</p>")));
}

#[tokio::test]
async fn test_diagnose_store_failure_is_internal_error() {
    let app = TestApp::new(MemoryStore::unavailable(), StubEncyclopedia::default());

    let response = app
        .post_form("name=Ana&email=ana%40example.com&symptoms=tos")
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Error en el proceso de diagnóstico");
    assert!(body["details"].as_str().unwrap().contains("database error"));
}

// =============================================================================
// GET /results
// =============================================================================

#[tokio::test]
async fn test_results_lists_every_diagnostic() {
    let app = TestApp::new(
        MemoryStore::default(),
        StubEncyclopedia::with_articles(vec![article("Gripe", "Enfermedad infecciosa.")]),
    );

    app.post_form("name=Ana&email=ana%40example.com&symptoms=fiebre")
        .await;
    app.post_form("name=Beto&email=beto%40example.com&symptoms=tos")
        .await;

    let response = app.get("/results").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert_eq!(html.matches("class=\"diagnostic\"").count(), 2);
    assert!(html.contains("Ana"));
    assert!(html.contains("Beto"));
    assert!(html.contains(">Gripe</a>"));
}

#[tokio::test]
async fn test_results_empty_store() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    let html = body_text(app.get("/results").await).await;

    assert_eq!(html.matches("class=\"diagnostic\"").count(), 0);
    assert!(html.contains("Todavía no hay diagnósticos."));
}

#[tokio::test]
async fn test_results_store_failure_is_internal_error() {
    let app = TestApp::new(MemoryStore::unavailable(), StubEncyclopedia::default());

    let response = app.get("/results").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_results_escapes_markup_in_fallback_symptoms() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    let response = app
        .post_form("name=Ana&email=ana%40example.com&symptoms=%3Cscript%3Ealert(1)%3C%2Fscript%3E")
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let diagnostics = app.store.diagnostics();
    let stored = &diagnostics[0].diagnosis;
    assert!(stored.starts_with(FALLBACK_PREFIX));
    assert!(!stored.contains("<script>"));

    let html = body_text(app.get("/results").await).await;
    assert!(!html.contains("<script>"));
    assert!(!html.contains("</script>"));
    assert!(html.contains("alert(1)"));
}

// =============================================================================
// GET /
// =============================================================================

#[tokio::test]
async fn test_home_renders_form() {
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("action=\"/diagnose\""));
    assert!(html.contains("name=\"symptoms\""));
    assert!(app.store.users().is_empty());
}

// =============================================================================
// GET /test_api
// =============================================================================

#[tokio::test]
async fn test_api_returns_first_five_items() {
    let upstream = Router::new().route(
        "/api/articles.json",
        get(|| async { Json(eight_articles()) }),
    );
    let url = spawn_upstream(upstream).await;
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default())
        .with_articles_api(url);

    let response = app.get("/test_api").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], 200);
    let items = body["response"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0]["title"], "Artículo 1");
    assert_eq!(items[4]["title"], "Artículo 5");
}

#[tokio::test]
async fn test_api_reports_upstream_status() {
    let upstream = Router::new().route(
        "/api/articles.json",
        get(|| async { (StatusCode::NON_AUTHORITATIVE_INFORMATION, Json(eight_articles())) }),
    );
    let url = spawn_upstream(upstream).await;
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default())
        .with_articles_api(url);

    let body = body_json(app.get("/test_api").await).await;

    assert_eq!(body["status"], 203);
    assert_eq!(body["response"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_api_object_body_is_error() {
    let upstream = Router::new().route(
        "/api/articles.json",
        get(|| async { Json(json!({"articles": []})) }),
    );
    let url = spawn_upstream(upstream).await;
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default())
        .with_articles_api(url);

    let response = app.get("/test_api").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "unexpected response shape: expected a JSON array, got an object"})
    );
}

#[tokio::test]
async fn test_api_non_json_body_is_error() {
    let upstream = Router::new().route("/api/articles.json", get(|| async { "<html></html>" }));
    let url = spawn_upstream(upstream).await;
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default())
        .with_articles_api(url);

    let response = app.get("/test_api").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("invalid JSON response"));
}

#[tokio::test]
async fn test_api_unreachable_upstream_is_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{addr}/api/articles.json")).unwrap();
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default())
        .with_articles_api(url);

    let response = app.get("/test_api").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_readiness_reflects_store() {
    let up = TestApp::new(MemoryStore::default(), StubEncyclopedia::default());
    let down = TestApp::new(MemoryStore::unavailable(), StubEncyclopedia::default());

    assert_eq!(up.get("/health").await.status(), StatusCode::OK);
    assert_eq!(up.get("/health/ready").await.status(), StatusCode::OK);
    assert_eq!(
        down.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

// =============================================================================
// Middleware
// =============================================================================

fn assert_security_headers(response: &Response, label: &str) {
    let headers = response.headers();
    assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff", "{label}");
    assert_eq!(headers[X_FRAME_OPTIONS], "SAMEORIGIN", "{label}");
    assert_eq!(headers[X_XSS_PROTECTION], "1; mode=block", "{label}");
}

#[tokio::test]
async fn test_every_endpoint_sends_security_headers() {
    let upstream = Router::new().route(
        "/api/articles.json",
        get(|| async { Json(eight_articles()) }),
    );
    let url = spawn_upstream(upstream).await;
    let app = TestApp::new(MemoryStore::default(), StubEncyclopedia::default())
        .with_articles_api(url);

    for uri in ["/", "/results", "/test_api", "/health", "/health/ready", "/no-such-page"] {
        let response = app.get(uri).await;
        assert_security_headers(&response, uri);
        assert!(response.headers().contains_key("x-request-id"), "{uri}");
    }

    let redirected = app
        .post_form("name=Ana&email=ana%40example.com&symptoms=tos")
        .await;
    assert_security_headers(&redirected, "POST /diagnose (302)");

    let rejected = app.post_form("name=Ana").await;
    assert_security_headers(&rejected, "POST /diagnose (400)");

    let failing = TestApp::new(MemoryStore::unavailable(), StubEncyclopedia::default());
    let failed = failing
        .post_form("name=Ana&email=ana%40example.com&symptoms=tos")
        .await;
    assert_security_headers(&failed, "POST /diagnose (500)");
}
