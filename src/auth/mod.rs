// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Auth0 bearer token validation for the DataHub connector.
//!
//! ## Auth Flow
//!
//! 1. Caller obtains an Auth0 access token (client credentials)
//! 2. Caller sends `Authorization: Bearer <token>`
//! 3. Server:
//!    - Reads `kid` from the token header
//!    - Fetches the tenant JWKS and picks the matching key
//!    - Verifies signature, `exp` and `nbf` (configurable leeway)
//!    - Requires `aud`, `iss`, `iat`, `exp`
//!    - Matches audience (`aud` / `appid` / `azp`) and tenant
//!      (`tid` / `iss` / `aud`) against [`IssuerInfo`]
//!
//! ## Notes
//!
//! - Validation failures are logged and reported as "not valid"
//! - JWKS is fetched on every validation (no cache)

pub mod claims;
pub mod error;
pub mod extractor;
pub mod issuer;
pub mod jwks;
pub mod validator;

pub use claims::{Audience, AuthenticatedUser, TokenClaims};
pub use error::{AuthError, AuthErrorBody, ClaimMismatch, TokenError};
pub use extractor::{bearer_token, Auth};
pub use issuer::{IssuerInfo, IssuerRegistry, TokenIssuer};
pub use jwks::{JwksResolver, SigningKey, SigningKeyResolver};
pub use validator::{TokenValidator, DEFAULT_NBF_LEEWAY_SECONDS};
