//! Security headers middleware.
//!
//! Every response leaves with the same three headers, whatever handler (or
//! fallback) produced it.

use axum::{
    extract::Request,
    http::{
        HeaderValue,
        header::{X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION},
    },
    middleware::Next,
    response::Response,
};

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `X-Frame-Options: SAMEORIGIN` - Only our own pages may frame us
/// - `X-XSS-Protection: 1; mode=block` - Legacy browser XSS filter
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));

    response
}
