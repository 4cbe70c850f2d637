// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared helpers for unit tests: a fixed RSA key pair, token minting and a
//! key resolver that never touches the network.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};

use crate::auth::{
    IssuerInfo, IssuerRegistry, SigningKey, SigningKeyResolver, TokenError, TokenIssuer,
};

pub const TEST_KID: &str = "test-key-1";
pub const TEST_CLIENT_ID: &str = "abc123clientid";
pub const TEST_TENANT_ID: &str = "datahub-api";

const SIGNING_KEY_PEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/testdata/signing_key.pem"
));
const FOREIGN_KEY_PEM: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/testdata/foreign_key.pem"
));
const SIGNING_KEY_MODULUS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/testdata/signing_key.n"
));

/// JWKS document publishing the test signing key under [`TEST_KID`].
pub fn jwks_document() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": TEST_KID,
            "n": SIGNING_KEY_MODULUS.trim(),
            "e": "AQAB"
        }]
    })
}

pub fn test_issuer_info(jwks_uri: impl Into<String>) -> IssuerInfo {
    IssuerInfo::new(TEST_CLIENT_ID, TEST_TENANT_ID, jwks_uri)
}

pub fn test_registry() -> IssuerRegistry {
    IssuerRegistry::new().with_issuer(
        TokenIssuer::Auth0,
        test_issuer_info("https://tenant.example.auth0.com/.well-known/jwks.json"),
    )
}

/// Claims that pass every check against [`test_registry`].
pub fn valid_claims() -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": "https://tenant.example.auth0.com/",
        "sub": format!("{TEST_CLIENT_ID}@clients"),
        "aud": TEST_TENANT_ID,
        "iat": now,
        "exp": now + 3600,
        "azp": TEST_CLIENT_ID,
        "gty": "client-credentials"
    })
}

/// Sign claims with the test key under [`TEST_KID`].
pub fn mint_token(claims: &Value) -> String {
    mint_token_with(claims, Some(TEST_KID), SIGNING_KEY_PEM)
}

/// Sign claims with a key that is not published in the JWKS.
pub fn mint_foreign_token(claims: &Value) -> String {
    mint_token_with(claims, Some(TEST_KID), FOREIGN_KEY_PEM)
}

/// Sign claims with the test key but leave `kid` out of the header.
pub fn mint_token_without_kid(claims: &Value) -> String {
    mint_token_with(claims, None, SIGNING_KEY_PEM)
}

fn mint_token_with(claims: &Value, kid: Option<&str>, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("test key parses");
    jsonwebtoken::encode(&header, claims, &key).expect("test token encodes")
}

/// Build an unsigned token from raw header and payload JSON.
pub fn craft_raw_jwt(header: &Value, payload: &Value) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).expect("header json"));
    let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).expect("payload json"));
    format!("{header_b64}.{payload_b64}.fake_signature")
}

/// Resolver serving the test public key without any HTTP.
pub struct StaticKeyResolver;

#[async_trait]
impl SigningKeyResolver for StaticKeyResolver {
    async fn resolve(&self, kid: &str, _issuer: &IssuerInfo) -> Result<SigningKey, TokenError> {
        if kid != TEST_KID {
            return Err(TokenError::KeyNotFound(kid.to_string()));
        }
        let decoding_key = DecodingKey::from_rsa_components(SIGNING_KEY_MODULUS.trim(), "AQAB")
            .map_err(|e| TokenError::JwksFetch(e.to_string()))?;
        Ok(SigningKey {
            decoding_key,
            algorithm: Algorithm::RS256,
        })
    }
}

/// Management API configuration pointing at a mock server.
pub fn auth0_config(base: &str) -> crate::auth0::Auth0ManagementConfig {
    crate::auth0::Auth0ManagementConfig {
        base_url: url::Url::parse(base).expect("mock url parses"),
        client_id: "mgmt-client".to_string(),
        client_secret: "mgmt-secret".to_string(),
        audience: "https://tenant.auth0.com/api/v2/".to_string(),
        api_identifier: "datahub-api".to_string(),
    }
}

/// Resolver collaborators backed by an in-memory store and audit sink, with
/// the management API at `auth0_base`.
pub fn resolver_context(
    auth0_base: &str,
) -> (
    crate::graphql::ResolverContext,
    crate::storage::InMemoryDataHub,
    std::sync::Arc<crate::storage::MemoryAuditSink>,
) {
    use std::sync::Arc;
    use std::time::Duration;

    let store = crate::storage::InMemoryDataHub::new();
    let audit = Arc::new(crate::storage::MemoryAuditSink::new());
    let context = crate::graphql::ResolverContext {
        datahub: Arc::new(store.clone()),
        retry: crate::storage::RetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
        auth0: crate::auth0::Auth0Accessor::new(reqwest::Client::new(), &auth0_config(auth0_base)),
        audit: audit.clone(),
    };
    (context, store, audit)
}

/// Schema over [`resolver_context`].
pub fn resolver_schema(
    auth0_base: &str,
) -> (
    crate::graphql::DataHubSchema,
    crate::storage::InMemoryDataHub,
    std::sync::Arc<crate::storage::MemoryAuditSink>,
) {
    let (context, store, audit) = resolver_context(auth0_base);
    (crate::graphql::build_schema(context), store, audit)
}

/// A stored registration for customer `ACME`.
pub fn stored_registration(code: &str, client_id: &str) -> crate::models::GenericApiRegistration {
    crate::models::GenericApiRegistration {
        app_registration_code: code.to_string(),
        customer_code: "ACME".to_string(),
        client_id: Some(client_id.to_string()),
        app_type: Some("Feed".to_string()),
        app_name: Some("Acme Feed".to_string()),
        response_type: Some("json".to_string()),
        ..Default::default()
    }
}
