//! Session authentication middleware.
//!
//! Reads the two token cookies, runs the request authenticator, and injects
//! the principal into request extensions. When the authenticator minted a
//! fresh access token, the cookie is set on the response after the inner
//! handler runs - the authenticator itself performs no HTTP I/O.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::super::cookies::{access_token_cookie, extract_cookie};
use crate::api::AppState;
use crate::config::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::errors::AppError;

/// Authenticated principal attached to the request.
///
/// Populated only by this middleware; read-only downstream.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
}

/// Cookie-based session authentication middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let access = extract_cookie(request.headers(), ACCESS_TOKEN_COOKIE);
    let refresh = extract_cookie(request.headers(), REFRESH_TOKEN_COOKIE);

    let outcome = state
        .authenticator
        .authenticate(access.as_deref(), refresh.as_deref())
        .await?;

    request.extensions_mut().insert(CurrentUser {
        id: outcome.principal_id,
    });

    let mut response = next.run(request).await;

    // Renewal happened: hand the fresh access token back to the client.
    if let Some(token) = outcome.new_access_token {
        response
            .headers_mut()
            .append(SET_COOKIE, access_token_cookie(&token));
    }

    Ok(response)
}
