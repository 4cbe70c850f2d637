// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! [`TokenError`] is the validation taxonomy used inside the validator and
//! never leaves it except as [`TokenError::MissingToken`]. [`AuthError`] is
//! what HTTP callers see.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::issuer::TokenIssuer;

/// Reasons a bearer token fails validation.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Empty or absent token. Indicates a caller bug, so it is the one
    /// variant allowed to escape [`super::TokenValidator::validate`].
    #[error("No access token present on the request")]
    MissingToken,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    /// Signature mismatch, unsupported algorithm, expiry or not-before.
    #[error("Token signature or lifetime is invalid: {0}")]
    InvalidSignature(String),

    #[error("Token had a valid signature but is missing common claims: {0}")]
    IncompleteClaims(String),

    #[error("{0}")]
    ClaimMismatch(ClaimMismatch),

    #[error("No signing key with id {0} in JWKS")]
    KeyNotFound(String),

    #[error("Failed to fetch JWKS: {0}")]
    JwksFetch(String),

    #[error("No issuer configuration for {0}")]
    UnknownIssuer(TokenIssuer),
}

/// Which semantic claim check failed, with the values that were compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimMismatch {
    Audience {
        aud: Option<String>,
        expected: String,
    },
    Tenant {
        tid: Option<String>,
        iss: Option<String>,
        aud: Option<String>,
        expected: String,
    },
}

impl fmt::Display for ClaimMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("<none>")
        }

        match self {
            ClaimMismatch::Audience { aud, expected } => write!(
                f,
                "Audience value in payload {} does not match config value {expected}",
                show(aud)
            ),
            ClaimMismatch::Tenant {
                tid,
                iss,
                aud,
                expected,
            } => write!(
                f,
                "Tenant id in payload {}, {}, or {} does not match config value {expected}",
                show(tid),
                show(iss),
                show(aud)
            ),
        }
    }
}

/// Authentication error returned to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header, or a header with no token in it
    MissingAuthHeader,
    /// Header value is not valid visible ASCII
    InvalidAuthHeader,
    /// Token failed validation
    InvalidToken,
    /// Token validated but carries no `azp` client id
    MissingClientId,
}

/// JSON body of a 401 response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthErrorBody {
    pub error: String,
    /// Stable machine-readable code, e.g. `missing_auth_header`
    pub error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::MissingClientId => "missing_client_id",
        }
    }

    /// Every authentication failure is a 401.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingAuthHeader | AuthError::InvalidAuthHeader => write!(
                f,
                "Unauthorized: Access denied. Authorization header is missing or token could not be found."
            ),
            AuthError::InvalidToken | AuthError::MissingClientId => write!(
                f,
                "Unauthorized: Access denied. Please provide a valid auth0 client id."
            ),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Authorization header is missing"));
    }

    #[test]
    fn missing_client_id_message_differs_from_missing_header() {
        assert_ne!(
            AuthError::MissingClientId.to_string(),
            AuthError::MissingAuthHeader.to_string()
        );
        assert!(AuthError::MissingClientId
            .to_string()
            .contains("valid auth0 client id"));
    }

    #[test]
    fn audience_mismatch_names_both_values() {
        let err = TokenError::ClaimMismatch(ClaimMismatch::Audience {
            aud: Some("other-api".into()),
            expected: "datahub-api".into(),
        });
        let message = err.to_string();
        assert!(message.starts_with("Audience value"));
        assert!(message.contains("other-api"));
        assert!(message.contains("datahub-api"));
    }

    #[test]
    fn tenant_mismatch_shows_missing_claims() {
        let err = ClaimMismatch::Tenant {
            tid: None,
            iss: Some("https://other.example.com/".into()),
            aud: None,
            expected: "datahub".into(),
        };
        assert_eq!(
            err.to_string(),
            "Tenant id in payload <none>, https://other.example.com/, or <none> does not match config value datahub"
        );
    }
}
