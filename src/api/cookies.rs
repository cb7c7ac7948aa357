//! Session cookie handling.
//!
//! The two token cookies are plain Set-Cookie header values; no cookie
//! crate is needed for two fixed shapes.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::{
    ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_TTL_DAYS,
};

/// Extract a cookie value from request headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Set-Cookie value for the access token: httpOnly, 15 minutes.
/// Set on login and on every renewal.
pub fn access_token_cookie(token: &str) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        ACCESS_TOKEN_COOKIE,
        token,
        ACCESS_TOKEN_TTL_MINUTES * 60
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Set-Cookie value for the refresh token: httpOnly, SameSite=None,
/// Secure in production, 30 days. Set only on login.
pub fn refresh_token_cookie(token: &str, production: bool) -> HeaderValue {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=None; Max-Age={}",
        REFRESH_TOKEN_COOKIE,
        token,
        REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60
    );
    if production {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}
