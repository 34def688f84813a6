//! Cookie-backed credentials.
//!
//! `CookieCredentials` is an Axum extractor that parses the `Cookie`
//! header once per request. Cookie writing for refreshed tokens lives here
//! too so the attribute set stays in one place.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use std::collections::HashMap;
use std::convert::Infallible;

use super::CredentialStore;

const MAX_AGE_SECS: u64 = 30 * 24 * 3600; // 30 days

/// Credentials parsed from the request's `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct CookieCredentials {
    cookies: HashMap<String, String>,
}

impl CookieCredentials {
    pub fn from_header(header_value: &str) -> Self {
        let cookies = header_value
            .split(';')
            .filter_map(|part| {
                let (name, value) = part.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { cookies }
    }
}

impl CredentialStore for CookieCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}

impl<S> FromRequestParts<S> for CookieCredentials
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        Ok(Self::from_header(&header_value))
    }
}

/// Fixed credentials, for tooling and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// `Set-Cookie` value storing a credential.
pub fn make_set_cookie(name: &str, value: &str, https_only: bool) -> String {
    let mut parts = vec![
        format!("{name}={value}"),
        format!("Max-Age={MAX_AGE_SECS}"),
        "Path=/".into(),
        "HttpOnly".into(),
        "SameSite=Lax".into(),
    ];
    if https_only {
        parts.push("Secure".into());
    }
    parts.join("; ")
}
