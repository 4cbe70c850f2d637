// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation.
//!
//! ## Steps
//!
//! 1. Reject an empty token outright ([`TokenError::MissingToken`])
//! 2. Read `kid` from the unverified header
//! 3. Resolve the signing key from the issuer's JWKS
//! 4. Verify signature, `exp` and `nbf` (with leeway)
//! 5. Require `aud`, `iss`, `iat`, `exp`
//! 6. Match audience and tenant against the issuer configuration
//!
//! Failures in steps 2-6 are logged and reported as "not valid"; they never
//! propagate to the caller.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::{debug, error};

use super::claims::TokenClaims;
use super::error::{ClaimMismatch, TokenError};
use super::issuer::{IssuerInfo, IssuerRegistry, TokenIssuer};
use super::jwks::SigningKeyResolver;

/// Default clock tolerance for `exp` / `nbf`, in seconds.
pub const DEFAULT_NBF_LEEWAY_SECONDS: u64 = 60;

pub struct TokenValidator {
    issuers: IssuerRegistry,
    keys: Arc<dyn SigningKeyResolver>,
    leeway: u64,
}

impl TokenValidator {
    pub fn new(issuers: IssuerRegistry, keys: Arc<dyn SigningKeyResolver>) -> Self {
        Self {
            issuers,
            keys,
            leeway: DEFAULT_NBF_LEEWAY_SECONDS,
        }
    }

    pub fn with_leeway(mut self, leeway_seconds: u64) -> Self {
        self.leeway = leeway_seconds;
        self
    }

    /// Whether `token` is valid for `issuer`.
    ///
    /// Only an empty token is an error; every other failure is logged and
    /// returns `Ok(false)`.
    pub async fn validate(&self, token: &str, issuer: TokenIssuer) -> Result<bool, TokenError> {
        Ok(self.authenticate(token, issuer).await?.is_some())
    }

    /// Same contract as [`Self::validate`], but hands back the verified
    /// claims on success.
    pub async fn authenticate(
        &self,
        token: &str,
        issuer: TokenIssuer,
    ) -> Result<Option<TokenClaims>, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::MissingToken);
        }

        debug!(issuer = %issuer, "validate-token");

        let outcome = match self.verify(token, issuer).await {
            Ok(claims) => self.validate_claims(&claims, issuer).map(|()| claims),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(claims) => Ok(Some(claims)),
            Err(e) => {
                error!(
                    issuer = %issuer,
                    error = %e,
                    "unable-to-validate-token: Invalid or non-existent token"
                );
                Ok(None)
            }
        }
    }

    /// Cryptographic verification plus the structural claim check.
    pub async fn verify(&self, token: &str, issuer: TokenIssuer) -> Result<TokenClaims, TokenError> {
        let info = self.issuer_info(issuer)?;

        let header = decode_header(token).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| TokenError::Malformed("kid not present in JWT header".to_string()))?;

        let key = self.keys.resolve(&kid, info).await?;

        // Audience and the required claim set are checked below, against the
        // issuer configuration, instead of by the decoder.
        let mut validation = Validation::new(key.algorithm);
        validation.leeway = self.leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<TokenClaims>(token, &key.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Malformed(e.to_string()),
                _ => TokenError::InvalidSignature(e.to_string()),
            })?;

        require_common_claims(&token_data.claims)?;

        Ok(token_data.claims)
    }

    /// Semantic audience and tenant checks for `issuer`.
    pub fn validate_claims(&self, claims: &TokenClaims, issuer: TokenIssuer) -> Result<(), TokenError> {
        debug!(issuer = %issuer, sub = ?claims.sub, "incoming-token-validation");
        check_claims(claims, self.issuer_info(issuer)?)
    }

    fn issuer_info(&self, issuer: TokenIssuer) -> Result<&IssuerInfo, TokenError> {
        self.issuers
            .get(issuer)
            .ok_or(TokenError::UnknownIssuer(issuer))
    }
}

/// `aud`, `iss`, `iat` and `exp` must all be present (and non-empty/non-zero).
fn require_common_claims(claims: &TokenClaims) -> Result<(), TokenError> {
    let mut missing = Vec::new();
    if !claims.aud.as_ref().is_some_and(|aud| aud.is_present()) {
        missing.push("aud");
    }
    if !claims.iss.as_deref().is_some_and(|iss| !iss.is_empty()) {
        missing.push("iss");
    }
    if !claims.iat.is_some_and(|iat| iat != 0) {
        missing.push("iat");
    }
    if !claims.exp.is_some_and(|exp| exp != 0) {
        missing.push("exp");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TokenError::IncompleteClaims(missing.join(", ")))
    }
}

/// Audience check, then tenant check.
///
/// Audience passes when `aud` equals the tenant id, or `appid` / `azp`
/// equals the client id. Tenant passes when the tenant id is a substring of
/// `tid`, `iss` or `aud`. Both checks accept any one of their alternatives
/// so consumer and business variants of the same issuer family validate.
pub fn check_claims(claims: &TokenClaims, info: &IssuerInfo) -> Result<(), TokenError> {
    let audience_ok = claims
        .aud
        .as_ref()
        .is_some_and(|aud| aud.is_exactly(&info.tenant_id))
        || claims.appid.as_deref() == Some(info.client_id.as_str())
        || claims.azp.as_deref() == Some(info.client_id.as_str());

    if !audience_ok {
        return Err(TokenError::ClaimMismatch(ClaimMismatch::Audience {
            aud: claims.aud.as_ref().map(ToString::to_string),
            expected: info.tenant_id.clone(),
        }));
    }

    let tenant_ok = claims
        .tid
        .as_deref()
        .is_some_and(|tid| tid.contains(&info.tenant_id))
        || claims
            .iss
            .as_deref()
            .is_some_and(|iss| iss.contains(&info.tenant_id))
        || claims
            .aud
            .as_ref()
            .is_some_and(|aud| aud.contains(&info.tenant_id));

    if !tenant_ok {
        return Err(TokenError::ClaimMismatch(ClaimMismatch::Tenant {
            tid: claims.tid.clone(),
            iss: claims.iss.clone(),
            aud: claims.aud.as_ref().map(ToString::to_string),
            expected: info.tenant_id.clone(),
        }));
    }

    Ok(())
}
