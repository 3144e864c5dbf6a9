//! Session user, token claims and credential extraction from request headers.

use crate::error::AppError;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

pub const ISSUER: &str = "todo-start";

/// Authenticated user as seen by handlers and server functions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    /// True when the session was verified against a signed token.
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn into_user(self) -> Result<SessionUser, AppError> {
        let id = self
            .sub
            .parse()
            .map_err(|_| AppError::Authentication("invalid token subject".into()))?;
        Ok(SessionUser {
            id,
            email: self.email,
            role: self.role,
            verified: true,
        })
    }
}

/// Find a session token: `Authorization: Bearer <token>` first, then the session cookie.
/// `Ok(None)` when neither is present; a present but malformed Authorization header is an error.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Result<Option<String>, AppError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::Authentication("invalid Authorization header".into()))?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Authentication("Authorization header must use Bearer".into()))?
            .trim();
        if token.is_empty() {
            return Err(AppError::Authentication("empty bearer token".into()));
        }
        return Ok(Some(token.to_string()));
    }
    Ok(cookie_value(headers, cookie_name))
}

/// Value of a cookie from all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("auth=def"));
        assert_eq!(token_from_headers(&headers, "auth").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; other=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("auth=tok.en.value"));
        assert_eq!(token_from_headers(&headers, "auth").unwrap().as_deref(), Some("tok.en.value"));
        assert_eq!(token_from_headers(&headers, "session").unwrap(), None);
    }

    #[test]
    fn malformed_authorization_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(matches!(
            token_from_headers(&headers, "auth"),
            Err(AppError::Authentication(_))
        ));
        assert_eq!(token_from_headers(&HeaderMap::new(), "auth").unwrap(), None);
    }
}
