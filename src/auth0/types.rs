// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth0 Management API payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Management API credentials and endpoints.
#[derive(Debug, Clone)]
pub struct Auth0ManagementConfig {
    /// Tenant base URL, e.g. `https://tenant.eu.auth0.com`
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: String,
    /// Management API audience, e.g. `https://tenant.eu.auth0.com/api/v2/`
    pub audience: String,
    /// API that newly registered clients are granted access to
    pub api_identifier: String,
}

/// Response of the client-credentials exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagementToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub token_type: String,
}

/// What a new or renamed client registration is built from.
#[derive(Debug, Clone, Copy)]
pub struct ClientRegistrationDetails<'a> {
    pub app_name: &'a str,
    pub customer_code: &'a str,
}

/// An Auth0 application (client).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth0Client {
    pub client_id: String,
    /// Only returned on creation
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientGrant {
    #[serde(default)]
    pub id: Option<String>,
    pub client_id: String,
    pub audience: String,
    #[serde(default)]
    pub scope: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth0UserInformation {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth0Connection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
