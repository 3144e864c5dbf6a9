//! In-process client for the backend API, used by server functions and pages.
//!
//! Requests go through the backend router with `oneshot`, so they see exactly what an HTTP
//! client would. Non-2xx responses are mapped back onto [`AppError`].

use crate::auth::SessionUser;
use crate::error::{AppError, ErrorKind};
use crate::response::{SuccessMany, SuccessOne};
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceExt;

/// Largest response body the client will buffer.
const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct Api {
    router: Router,
    forwarded: Vec<(header::HeaderName, HeaderValue)>,
    user: Option<SessionUser>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

impl Api {
    pub(crate) fn new(router: Router, headers: &HeaderMap, user: Option<SessionUser>) -> Self {
        let forwarded = [header::AUTHORIZATION, header::COOKIE]
            .into_iter()
            .flat_map(|name| {
                headers
                    .get_all(&name)
                    .iter()
                    .map(|v| (name.clone(), v.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();
        Api { router, forwarded, user }
    }

    /// The verified session user, if the handle was created with `verify_session`.
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn data(&self) -> DataApi<'_> {
        DataApi { api: self }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<&Value>) -> Result<Bytes, AppError> {
        let mut builder = Request::builder().method(method.clone()).uri(uri);
        for (name, value) in &self.forwarded {
            builder = builder.header(name, value);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(v).map_err(|e| AppError::Internal(e.to_string()))?)
            }
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| AppError::Transport(format!("invalid request {}: {}", uri, e)))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| AppError::Transport(format!("reading response body: {}", e)))?;
        tracing::debug!(%method, uri, status = status.as_u16(), "backend call");

        if !status.is_success() {
            return Err(decode_error(status, &bytes));
        }
        Ok(bytes)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, uri: &str, body: Option<&Value>) -> Result<T, AppError> {
        let bytes = self.send(method, uri, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| AppError::Transport(format!("undecodable response from {}: {}", uri, e)))
    }
}

fn decode_error(status: StatusCode, bytes: &[u8]) -> AppError {
    let message = serde_json::from_slice::<ErrorEnvelope>(bytes)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
    let kind = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Validation,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Authentication,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        _ => ErrorKind::Transport,
    };
    let message = if kind == ErrorKind::Transport {
        format!("backend responded {}: {}", status, message)
    } else {
        message
    };
    AppError::from_kind(kind, message)
}

/// List options for [`DataApi::read_many`]. Unset values use the backend defaults.
#[derive(Clone, Debug, Default)]
pub struct ReadQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl ReadQuery {
    fn to_query_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".into(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".into(), offset.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".into(), sort.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        if pairs.is_empty() {
            return String::new();
        }
        let joined = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("?{}", joined)
    }
}

/// Entity CRUD calls against `/api/data/entity/...`.
pub struct DataApi<'a> {
    api: &'a Api,
}

impl DataApi<'_> {
    fn path(entity: &str, id: Option<i64>) -> String {
        let base = format!("/api/data/entity/{}", urlencoding::encode(entity));
        match id {
            Some(id) => format!("{}/{}", base, id),
            None => base,
        }
    }

    pub async fn read_many(&self, entity: &str, query: &ReadQuery) -> Result<SuccessMany<Value>, AppError> {
        let uri = format!("{}{}", Self::path(entity, None), query.to_query_string());
        self.api.call(Method::GET, &uri, None).await
    }

    pub async fn read_one(&self, entity: &str, id: i64) -> Result<Value, AppError> {
        let res: SuccessOne<Value> = self.api.call(Method::GET, &Self::path(entity, Some(id)), None).await?;
        Ok(res.data)
    }

    pub async fn create_one(&self, entity: &str, values: Value) -> Result<Value, AppError> {
        let res: SuccessOne<Value> = self
            .api
            .call(Method::POST, &Self::path(entity, None), Some(&values))
            .await?;
        Ok(res.data)
    }

    pub async fn update_one(&self, entity: &str, id: i64, values: Value) -> Result<Value, AppError> {
        let res: SuccessOne<Value> = self
            .api
            .call(Method::PATCH, &Self::path(entity, Some(id)), Some(&values))
            .await?;
        Ok(res.data)
    }

    pub async fn delete_one(&self, entity: &str, id: i64) -> Result<(), AppError> {
        self.api.send(Method::DELETE, &Self::path(entity, Some(id)), None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_strings_are_encoded() {
        let q = ReadQuery {
            limit: Some(5),
            sort: Some("-id".into()),
            filters: vec![("title".into(), "a&b c".into())],
            ..Default::default()
        };
        assert_eq!(q.to_query_string(), "?limit=5&sort=-id&title=a%26b%20c");
        assert_eq!(ReadQuery::default().to_query_string(), "");
    }

    #[test]
    fn error_statuses_map_onto_the_taxonomy() {
        let body = br#"{"error":{"code":"not_found","message":"todos 9"}}"#;
        let err = decode_error(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, AppError::NotFound(ref m) if m == "todos 9"));
        assert!(matches!(decode_error(StatusCode::UNPROCESSABLE_ENTITY, b"{}"), AppError::Validation(_)));
        assert!(matches!(decode_error(StatusCode::UNAUTHORIZED, b""), AppError::Authentication(_)));
        assert!(matches!(decode_error(StatusCode::BAD_GATEWAY, b"upstream"), AppError::Transport(_)));
        assert!(matches!(
            decode_error(StatusCode::INTERNAL_SERVER_ERROR, b"{}"),
            AppError::Transport(_)
        ));
    }
}
