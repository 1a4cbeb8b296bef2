//! Extractor for the authenticated caller.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Session token from the session cookie, if present
fn session_cookie_token<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    let cookie_str = parts.headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_str
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Session token from an `Authorization: Bearer` header, if present
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // cookie first; a stale cookie falls through to the header
        let candidates = [session_cookie_token(parts, &state.config.auth.session.cookie_name), bearer_token(parts)];

        let mut last_error = None;
        for token in candidates.into_iter().flatten() {
            match session::verify_session_token(token, &state.config) {
                Ok(user) => {
                    debug!("Authenticated session for employee {}", user.employee_id);
                    return Ok(user);
                }
                Err(e) => {
                    trace!("Session token rejected: {:?}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(Error::Internal { operation }) => Error::Internal { operation },
            Some(_) => Error::Unauthenticated {
                message: Some("Invalid or expired session".to_string()),
            },
            None => Error::Unauthenticated { message: None },
        })
    }
}
