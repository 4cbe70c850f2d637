// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static per-issuer configuration.
//!
//! The registry is built once from [`crate::config::AppConfig`] and handed to
//! the validator, so tests can swap tenants without touching globals.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Supported token issuers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenIssuer {
    Auth0,
}

impl fmt::Display for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenIssuer::Auth0 => write!(f, "Auth0"),
        }
    }
}

/// What a token from one issuer is expected to look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerInfo {
    /// Client id accepted in `azp` / `appid`
    pub client_id: String,
    /// Tenant identifier, matched against `aud` exactly and against
    /// `tid` / `iss` / `aud` as a substring
    pub tenant_id: String,
    /// JWKS endpoint publishing the issuer's signing keys
    pub jwks_uri: String,
}

impl IssuerInfo {
    pub fn new(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        jwks_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            jwks_uri: jwks_uri.into(),
        }
    }
}

/// Issuer configuration keyed by [`TokenIssuer`].
#[derive(Debug, Clone, Default)]
pub struct IssuerRegistry {
    issuers: HashMap<TokenIssuer, IssuerInfo>,
}

impl IssuerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the configuration for an issuer.
    pub fn with_issuer(mut self, issuer: TokenIssuer, info: IssuerInfo) -> Self {
        self.issuers.insert(issuer, info);
        self
    }

    pub fn get(&self, issuer: TokenIssuer) -> Option<&IssuerInfo> {
        self.issuers.get(&issuer)
    }
}
