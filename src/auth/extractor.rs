// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{AuthError, AuthenticatedUser, TokenError, TokenIssuer};
use crate::state::AppState;

/// Pull the raw token out of the `Authorization` header.
///
/// A `Bearer ` prefix is stripped when present; otherwise the whole header
/// value is taken as the token. An absent header or an empty token is
/// [`AuthError::MissingAuthHeader`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AuthError::MissingAuthHeader);
    }
    Ok(token)
}

/// Extractor for authenticated callers.
///
/// Validates the bearer token against the Auth0 issuer configuration and
/// yields the caller's identity. Used by the GraphQL endpoint, where `sub` is
/// the actor recorded in audit events.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if an outer layer already authenticated the request
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(&parts.headers)?;

        let claims = match state.validator.authenticate(token, TokenIssuer::Auth0).await {
            Ok(Some(claims)) => claims,
            Ok(None) => return Err(AuthError::InvalidToken),
            Err(TokenError::MissingToken) => return Err(AuthError::MissingAuthHeader),
            Err(e) => {
                warn!(error = %e, "unexpected token validation error");
                return Err(AuthError::InvalidToken);
            }
        };

        let user = AuthenticatedUser::from_claims(claims).ok_or(AuthError::InvalidToken)?;
        parts.extensions.insert(user.clone());

        Ok(Auth(user))
    }
}
