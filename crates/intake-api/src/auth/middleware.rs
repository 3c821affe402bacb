//! Upload token gate.
//!
//! The token is looked up in this order and the first non-empty value wins:
//! query `uploadToken`, form field `uploadToken` (urlencoded or multipart),
//! `Authorization: Bearer`, cookie `upload_token`.

use crate::auth::upload_token::UploadTokenService;
use crate::error::HttpAppError;
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use intake_core::AppError;
use std::sync::Arc;

pub const UPLOAD_TOKEN_PARAM: &str = "uploadToken";
pub const UPLOAD_TOKEN_COOKIE: &str = "upload_token";

/// Largest form body buffered while looking for the token. Larger bodies pass through
/// untouched and the token must come from a header or cookie.
const MAX_FORM_BYTES: usize = 64 * 1024;

pub async fn upload_token_middleware(
    State(tokens): State<Arc<UploadTokenService>>,
    request: Request,
    next: Next,
) -> Response {
    let (request, token) = match extract_upload_token(request).await {
        Ok(found) => found,
        Err(e) => return e.into_response(),
    };

    let Some(token) = token else {
        return HttpAppError(AppError::Unauthorized(
            "Upload token is required".to_string(),
        ))
        .into_response();
    };

    if let Err(e) = tokens.validate(&token) {
        tracing::debug!(error = %e, "Upload token rejected");
        return HttpAppError(AppError::Unauthorized(
            "Invalid or expired upload token".to_string(),
        ))
        .into_response();
    }

    next.run(request).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    UrlEncoded,
    Multipart,
}

enum BufferedBody {
    Complete(Bytes),
    /// Cap exceeded; the consumed prefix is chained back in front of the rest.
    Overflow(Body),
}

/// Find the upload token, handing back the request with any buffered body restored.
async fn extract_upload_token(request: Request) -> Result<(Request, Option<String>), HttpAppError> {
    if let Some(token) = request
        .uri()
        .query()
        .and_then(|query| form_value(query.as_bytes(), UPLOAD_TOKEN_PARAM))
    {
        return Ok((request, Some(token)));
    }

    let request = match form_kind(request.headers()) {
        Some(kind) => {
            let (parts, body) = request.into_parts();
            let (body, token) = match buffer_form(body).await? {
                BufferedBody::Complete(bytes) => {
                    let token = match kind {
                        FormKind::UrlEncoded => form_value(&bytes, UPLOAD_TOKEN_PARAM),
                        FormKind::Multipart => {
                            multipart_value(parts.headers.get(header::CONTENT_TYPE), bytes.clone())
                                .await
                        }
                    };
                    (Body::from(bytes), token)
                }
                BufferedBody::Overflow(body) => {
                    tracing::debug!("Form body over buffer cap; skipping form token lookup");
                    (body, None)
                }
            };
            let request = Request::from_parts(parts, body);
            if token.is_some() {
                return Ok((request, token));
            }
            request
        }
        None => request,
    };

    let token = bearer_token(request.headers())
        .or_else(|| cookie_value(request.headers(), UPLOAD_TOKEN_COOKIE));

    Ok((request, token))
}

async fn buffer_form(body: Body) -> Result<BufferedBody, HttpAppError> {
    let mut stream = body.into_data_stream();
    let mut buffered = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| AppError::MalformedBody(format!("Failed to read form body: {}", e)))?;
        buffered.extend_from_slice(&chunk);
        if buffered.len() > MAX_FORM_BYTES {
            let head = futures::stream::once(async move {
                Ok::<_, axum::Error>(Bytes::from(buffered))
            });
            return Ok(BufferedBody::Overflow(Body::from_stream(head.chain(stream))));
        }
    }

    Ok(BufferedBody::Complete(Bytes::from(buffered)))
}

/// First non-file multipart field named `uploadToken`.
async fn multipart_value(content_type: Option<&HeaderValue>, bytes: Bytes) -> Option<String> {
    let request = Request::builder()
        .header(header::CONTENT_TYPE, content_type?.clone())
        .body(Body::from(bytes))
        .ok()?;
    let mut multipart = Multipart::from_request(request, &()).await.ok()?;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(UPLOAD_TOKEN_PARAM) && field.file_name().is_none() {
            return field.text().await.ok().filter(|value| !value.is_empty());
        }
    }
    None
}

fn form_value(input: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn form_kind(headers: &HeaderMap) -> Option<FormKind> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    if content_type.starts_with("application/x-www-form-urlencoded") {
        Some(FormKind::UrlEncoded)
    } else if content_type.starts_with("multipart/form-data") {
        Some(FormKind::Multipart)
    } else {
        None
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
