// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth0 Management API client registration operations.
//!
//! Error behavior differs per operation and callers rely on it:
//!
//! | Operation | On failure |
//! |-----------|------------|
//! | `lookup_users_by_email` | logged, empty list returned |
//! | `list_connections` | propagated |
//! | `create_client_registration` / `create_client_grant` | propagated |
//! | `update_client_registration` / `delete_client_registration` | logged, then propagated |

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::error;
use url::Url;

use super::error::Auth0Error;
use super::management::ManagementTokenProvider;
use super::types::{
    Auth0Client, Auth0Connection, Auth0ManagementConfig, Auth0UserInformation, ClientGrant,
    ClientRegistrationDetails,
};

/// Token lifetime for tokens issued to registered clients (10 hours).
const CLIENT_JWT_LIFETIME_SECONDS: u64 = 36_000;
/// Refresh token absolute lifetime (1 year).
const REFRESH_TOKEN_LIFETIME_SECONDS: u64 = 31_557_600;
/// Refresh token idle lifetime (30 days).
const REFRESH_TOKEN_IDLE_LIFETIME_SECONDS: u64 = 2_592_000;

#[derive(Debug, Clone)]
pub struct Auth0Accessor {
    http: Client,
    base_url: Url,
    api_identifier: String,
    tokens: ManagementTokenProvider,
}

impl Auth0Accessor {
    pub fn new(http: Client, config: &Auth0ManagementConfig) -> Self {
        Self {
            tokens: ManagementTokenProvider::new(http.clone(), config),
            http,
            base_url: config.base_url.clone(),
            api_identifier: config.api_identifier.clone(),
        }
    }

    /// Users registered under `email`. Request failures yield an empty list.
    pub async fn lookup_users_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<Auth0UserInformation>, Auth0Error> {
        let token = self.tokens.management_token().await?;
        let url = self.endpoint(&["users-by-email"])?;

        let request = self
            .http
            .get(url)
            .query(&[("email", email)])
            .bearer_auth(&token.access_token);

        let result = match send(request, "GET /api/v2/users-by-email").await {
            Ok(response) => read_json(response, "GET /api/v2/users-by-email").await,
            Err(message) => Err(Auth0Error::Request(message)),
        };

        match result {
            Ok(users) => Ok(users),
            Err(e) => {
                error!(
                    error = %e,
                    "auth0-error: There was a problem with the auth0 request for user information."
                );
                Ok(Vec::new())
            }
        }
    }

    pub async fn list_connections(&self) -> Result<Vec<Auth0Connection>, Auth0Error> {
        let token = self.tokens.management_token().await?;
        let url = self.endpoint(&["connections"])?;

        let request = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .bearer_auth(&token.access_token);

        let response = send(request, "GET /api/v2/connections")
            .await
            .map_err(Auth0Error::Request)?;
        read_json(response, "GET /api/v2/connections").await
    }

    /// Create a machine-to-machine client for a generic API registration.
    ///
    /// The security profile is fixed: client-credentials grant only, RS256,
    /// non-expiring non-rotating refresh tokens.
    pub async fn create_client_registration(
        &self,
        details: ClientRegistrationDetails<'_>,
    ) -> Result<Auth0Client, Auth0Error> {
        let token = self.tokens.management_token().await?;
        let url = self.endpoint(&["clients"])?;
        let payload = new_client_payload(details, &self.api_identifier);

        let request = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .bearer_auth(&token.access_token)
            .json(&payload);

        let response = send(request, "POST /api/v2/clients")
            .await
            .map_err(Auth0Error::Registration)?;
        let client: Auth0Client = read_json(response, "POST /api/v2/clients").await?;

        if client.client_id.trim().is_empty() {
            return Err(Auth0Error::InvalidResponse(
                "created client has no client_id".to_string(),
            ));
        }

        Ok(client)
    }

    /// Authorize `client_id` against the configured API identifier.
    pub async fn create_client_grant(&self, client_id: &str) -> Result<ClientGrant, Auth0Error> {
        let token = self.tokens.management_token().await?;
        let url = self.endpoint(&["client-grants"])?;

        let payload = json!({
            "client_id": client_id,
            "audience": self.api_identifier,
            "scope": []
        });

        let request = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .bearer_auth(&token.access_token)
            .json(&payload);

        let response = send(request, "POST /api/v2/client-grants")
            .await
            .map_err(Auth0Error::Registration)?;
        read_json(response, "POST /api/v2/client-grants").await
    }

    /// Rename a client. Only the name is changed.
    pub async fn update_client_registration(
        &self,
        client_id: &str,
        app_name: &str,
    ) -> Result<Auth0Client, Auth0Error> {
        let result = self.patch_client_name(client_id, app_name).await;
        if let Err(e) = &result {
            error!(
                client_id = %client_id,
                error = %e,
                "auth0-error: There was a problem with the auth0 Update Client."
            );
        }
        result
    }

    pub async fn delete_client_registration(&self, client_id: &str) -> Result<(), Auth0Error> {
        let result = self.delete_client(client_id).await;
        if let Err(e) = &result {
            error!(
                client_id = %client_id,
                error = %e,
                "auth0-error: There was a problem with the auth0 Delete Client."
            );
        }
        result
    }

    async fn patch_client_name(
        &self,
        client_id: &str,
        app_name: &str,
    ) -> Result<Auth0Client, Auth0Error> {
        let token = self.tokens.management_token().await?;
        let url = self.endpoint(&["clients", client_id])?;

        let request = self
            .http
            .patch(url)
            .header("Accept", "application/json")
            .bearer_auth(&token.access_token)
            .json(&json!({ "name": app_name }));

        let response = send(request, "PATCH /api/v2/clients")
            .await
            .map_err(Auth0Error::Registration)?;
        read_json(response, "PATCH /api/v2/clients").await
    }

    async fn delete_client(&self, client_id: &str) -> Result<(), Auth0Error> {
        let token = self.tokens.management_token().await?;
        let url = self.endpoint(&["clients", client_id])?;

        let request = self.http.delete(url).bearer_auth(&token.access_token);

        send(request, "DELETE /api/v2/clients")
            .await
            .map_err(Auth0Error::Registration)?;
        Ok(())
    }

    /// `{base_url}/api/v2/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Auth0Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Auth0Error::Request(format!("invalid Auth0 base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);
        Ok(url)
    }
}

fn new_client_payload(details: ClientRegistrationDetails<'_>, api_identifier: &str) -> Value {
    json!({
        "name": details.app_name,
        "description": format!("Auth0 Generic Api registration {}", details.customer_code),
        "callbacks": [],
        "client_aliases": [],
        "allowed_clients": [api_identifier],
        "grant_types": ["client_credentials"],
        "token_endpoint_auth_method": "client_secret_post",
        "app_type": "non_interactive",
        "is_first_party": true,
        "oidc_conformant": false,
        "jwt_configuration": {
            "lifetime_in_seconds": CLIENT_JWT_LIFETIME_SECONDS,
            "scopes": {},
            "alg": "RS256",
            "secret_encoded": false
        },
        "cross_origin_authentication": false,
        "sso_disabled": false,
        "custom_login_page_on": true,
        "native_social_login": {
            "apple": { "enabled": false },
            "facebook": { "enabled": false }
        },
        "refresh_token": {
            "expiration_type": "non-expiring",
            "leeway": 0,
            "infinite_token_lifetime": true,
            "infinite_idle_token_lifetime": true,
            "token_lifetime": REFRESH_TOKEN_LIFETIME_SECONDS,
            "idle_token_lifetime": REFRESH_TOKEN_IDLE_LIFETIME_SECONDS,
            "rotation_type": "non-rotating"
        }
    })
}

async fn send(request: RequestBuilder, label: &str) -> Result<Response, String> {
    let response = request
        .send()
        .await
        .map_err(|e| format!("{label} failed: {e}"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("{label} returned {status}: {body}"));
    }

    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response, label: &str) -> Result<T, Auth0Error> {
    response
        .json()
        .await
        .map_err(|e| Auth0Error::InvalidResponse(format!("{label} invalid JSON: {e}")))
}
