// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key resolution against an issuer's JWKS endpoint.
//!
//! Keys are not cached: every resolution fetches the key set again. Request
//! volume is low, and caching would change how often the tenant's JWKS
//! endpoint is hit.

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tracing::debug;

use super::error::TokenError;
use super::issuer::IssuerInfo;

/// A public key ready for signature verification.
#[derive(Clone)]
pub struct SigningKey {
    pub decoding_key: DecodingKey,
    pub algorithm: Algorithm,
}

/// Resolves the public key for a key id published by an issuer.
#[async_trait]
pub trait SigningKeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str, issuer: &IssuerInfo) -> Result<SigningKey, TokenError>;
}

/// Fetches keys over HTTPS from the issuer's `jwks_uri`.
#[derive(Clone)]
pub struct JwksResolver {
    client: reqwest::Client,
}

impl JwksResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch JWKS from the endpoint.
    pub async fn fetch_jwks(&self, jwks_uri: &str) -> Result<JwkSet, TokenError> {
        let response = self
            .client
            .get(jwks_uri)
            .send()
            .await
            .map_err(|e| TokenError::JwksFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TokenError::JwksFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TokenError::JwksFetch(e.to_string()))
    }
}

#[async_trait]
impl SigningKeyResolver for JwksResolver {
    async fn resolve(&self, kid: &str, issuer: &IssuerInfo) -> Result<SigningKey, TokenError> {
        debug!(jwks_uri = %issuer.jwks_uri, kid = %kid, "validate-token: resolving signing key");

        let jwks = self.fetch_jwks(&issuer.jwks_uri).await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or_else(|| TokenError::KeyNotFound(kid.to_string()))?;

        jwk_to_signing_key(jwk)
    }
}

/// Convert a JWK to a verification key.
pub fn jwk_to_signing_key(jwk: &Jwk) -> Result<SigningKey, TokenError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let decoding_key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| TokenError::JwksFetch(format!("invalid RSA key: {e}")))?;

            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                _ => Algorithm::RS256,
            };

            Ok(SigningKey {
                decoding_key,
                algorithm,
            })
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let decoding_key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| TokenError::JwksFetch(format!("invalid EC key: {e}")))?;

            let algorithm = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok(SigningKey {
                decoding_key,
                algorithm,
            })
        }
        _ => Err(TokenError::JwksFetch(
            "unsupported key type in JWKS".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{jwks_document, TEST_KID};

    fn issuer_for(server: &mockito::ServerGuard) -> IssuerInfo {
        IssuerInfo::new(
            "client",
            "datahub-api",
            format!("{}/.well-known/jwks.json", server.url()),
        )
    }

    #[tokio::test]
    async fn resolves_key_by_kid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(jwks_document().to_string())
            .create_async()
            .await;

        let resolver = JwksResolver::new(reqwest::Client::new());
        let key = resolver
            .resolve(TEST_KID, &issuer_for(&server))
            .await
            .expect("key resolves");

        assert_eq!(key.algorithm, Algorithm::RS256);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refetches_on_every_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(200)
            .with_body(jwks_document().to_string())
            .expect(2)
            .create_async()
            .await;

        let resolver = JwksResolver::new(reqwest::Client::new());
        let issuer = issuer_for(&server);
        resolver.resolve(TEST_KID, &issuer).await.unwrap();
        resolver.resolve(TEST_KID, &issuer).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_kid_is_key_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(200)
            .with_body(jwks_document().to_string())
            .create_async()
            .await;

        let resolver = JwksResolver::new(reqwest::Client::new());
        let result = resolver.resolve("rotated-away", &issuer_for(&server)).await;
        assert!(matches!(result, Err(TokenError::KeyNotFound(kid)) if kid == "rotated-away"));
    }

    #[tokio::test]
    async fn http_failure_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(503)
            .create_async()
            .await;

        let resolver = JwksResolver::new(reqwest::Client::new());
        let result = resolver.resolve(TEST_KID, &issuer_for(&server)).await;
        assert!(matches!(result, Err(TokenError::JwksFetch(_))));
    }

    #[tokio::test]
    async fn unparseable_body_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(200)
            .with_body("<html>not a key set</html>")
            .create_async()
            .await;

        let resolver = JwksResolver::new(reqwest::Client::new());
        let result = resolver.resolve(TEST_KID, &issuer_for(&server)).await;
        assert!(matches!(result, Err(TokenError::JwksFetch(_))));
    }
}
