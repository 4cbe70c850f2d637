// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated caller representation.

use serde::{Deserialize, Serialize};

/// The `aud` claim, which may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Strict equality. A list never equals a single value.
    pub fn is_exactly(&self, value: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == value,
            Audience::Many(_) => false,
        }
    }

    /// Substring match for a single audience, element match for a list.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::Single(aud) => aud.contains(value),
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }

    /// Truthiness of the claim for the structural check: an empty string
    /// counts as absent, a list (even an empty one) counts as present.
    pub fn is_present(&self) -> bool {
        match self {
            Audience::Single(aud) => !aud.is_empty(),
            Audience::Many(_) => true,
        }
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Audience::Single(aud) => write!(f, "{aud}"),
            Audience::Many(auds) => write!(f, "{}", auds.join(",")),
        }
    }
}

/// Claims carried by Auth0 (and Azure AD style) access tokens.
///
/// Every claim is optional at the type level; the validator decides which
/// ones are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    /// Tenant id (Azure AD)
    #[serde(default)]
    pub tid: Option<String>,
    /// Authorized party, the OAuth client the token was issued to
    #[serde(default)]
    pub azp: Option<String>,
    /// Application id (Azure AD)
    #[serde(default)]
    pub appid: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    /// Anything else the issuer adds (`scope`, `gty`, `permissions`, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Caller identity extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    /// Canonical caller id (`sub`), recorded as the actor in audit events
    pub user_code: String,

    /// OAuth client the token was issued to (`azp`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip)]
    pub issuer: Option<String>,

    #[serde(skip)]
    pub expires_at: Option<i64>,
}

impl AuthenticatedUser {
    /// Build from validated claims. Tokens without a subject carry no usable
    /// identity and yield `None`.
    pub fn from_claims(claims: TokenClaims) -> Option<Self> {
        let user_code = claims.sub.filter(|sub| !sub.is_empty())?;
        Some(Self {
            user_code,
            client_id: claims.azp,
            issuer: claims.iss,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> TokenClaims {
        serde_json::from_value(json!({
            "iss": "https://tenant.auth0.com/",
            "sub": "abc123@clients",
            "aud": "datahub-api",
            "iat": 1700000000,
            "exp": 1700003600,
            "azp": "abc123",
            "gty": "client-credentials"
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_single_audience_and_extras() {
        let claims = sample_claims();
        assert_eq!(claims.aud, Some(Audience::Single("datahub-api".into())));
        assert_eq!(claims.azp.as_deref(), Some("abc123"));
        assert_eq!(claims.extra["gty"], "client-credentials");
        assert!(claims.tid.is_none());
    }

    #[test]
    fn deserializes_audience_list() {
        let claims: TokenClaims =
            serde_json::from_value(json!({ "aud": ["datahub-api", "https://tenant.auth0.com/userinfo"] }))
                .unwrap();
        let aud = claims.aud.unwrap();
        assert!(aud.contains("datahub-api"));
        assert!(!aud.contains("datahub"));
        assert!(!aud.is_exactly("datahub-api"));
    }

    #[test]
    fn single_audience_matches_substring() {
        let aud = Audience::Single("https://datahub-api.example.com".into());
        assert!(aud.contains("datahub-api"));
        assert!(!aud.is_exactly("datahub-api"));
    }

    #[test]
    fn empty_audience_is_absent() {
        assert!(!Audience::Single(String::new()).is_present());
        assert!(Audience::Many(vec![]).is_present());
    }

    #[test]
    fn from_claims_extracts_user_and_client() {
        let user = AuthenticatedUser::from_claims(sample_claims()).unwrap();
        assert_eq!(user.user_code, "abc123@clients");
        assert_eq!(user.client_id.as_deref(), Some("abc123"));
        assert_eq!(user.expires_at, Some(1700003600));
    }

    #[test]
    fn from_claims_requires_subject() {
        let mut claims = sample_claims();
        claims.sub = None;
        assert!(AuthenticatedUser::from_claims(claims).is_none());
    }
}
