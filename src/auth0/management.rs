// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Management API access tokens.
//!
//! A fresh token is exchanged for every outbound call. Nothing is cached or
//! retried here.

use std::collections::HashMap;

use reqwest::Client;
use tracing::debug;

use super::error::Auth0Error;
use super::types::{Auth0ManagementConfig, ManagementToken};

#[derive(Debug, Clone)]
pub struct ManagementTokenProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    audience: String,
}

impl ManagementTokenProvider {
    pub fn new(http: Client, config: &Auth0ManagementConfig) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/oauth/token",
                config.base_url.as_str().trim_end_matches('/')
            ),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            audience: config.audience.clone(),
        }
    }

    /// Exchange the registration client's credentials for a management token.
    pub async fn management_token(&self) -> Result<ManagementToken, Auth0Error> {
        let mut form = HashMap::new();
        form.insert("grant_type", "client_credentials");
        form.insert("client_id", self.client_id.as_str());
        form.insert("client_secret", self.client_secret.as_str());
        form.insert("audience", self.audience.as_str());

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Auth0Error::TokenExchange(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Auth0Error::TokenExchange(format!(
                "token request returned {status}: {body}"
            )));
        }

        let token: ManagementToken = response
            .json()
            .await
            .map_err(|e| Auth0Error::TokenExchange(format!("invalid token response: {e}")))?;

        if token.access_token.trim().is_empty() {
            return Err(Auth0Error::TokenExchange(
                "token response did not include access_token".to_string(),
            ));
        }

        debug!(
            expires_in = token.expires_in,
            scope = %token.scope,
            token_type = %token.token_type,
            "auth0-response: management token issued"
        );

        Ok(token)
    }
}
