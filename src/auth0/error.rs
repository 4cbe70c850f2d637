// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth0 Management API errors.

#[derive(Debug, thiserror::Error)]
pub enum Auth0Error {
    /// Client-credentials exchange for a management token failed.
    #[error("Auth0 token exchange failed: {0}")]
    TokenExchange(String),

    /// Creating, granting, updating or deleting a client failed.
    #[error("Auth0 registration failed: {0}")]
    Registration(String),

    /// A read request (users, connections) failed.
    #[error("Auth0 request failed: {0}")]
    Request(String),

    #[error("Auth0 response was invalid: {0}")]
    InvalidResponse(String),
}
