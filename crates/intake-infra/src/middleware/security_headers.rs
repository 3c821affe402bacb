use axum::extract::State;
use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};

/// Security header policy for JSON API responses
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeaders {
    /// Emit `Strict-Transport-Security`; only meaningful behind HTTPS
    pub hsts: bool,
}

/// Adds security headers to all HTTP responses.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn security_headers_middleware(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    if policy.hsts {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
