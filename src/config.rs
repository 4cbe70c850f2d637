// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and passed
//! down explicitly. Nothing reads the environment after that.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH0_BASE_URL` | Auth0 tenant base URL | Required |
//! | `AUTH0_CLIENT_ID` | Client id accepted in `azp`/`appid` | Required |
//! | `AUTH0_AUDIENCE` | Tenant identifier expected in tokens | Required (or `AUTH0_AUDIENCE_CORE`) |
//! | `AUTH0_AUDIENCE_CORE` | Fallback for `AUTH0_AUDIENCE` | Optional |
//! | `AUTH0_JWKS_URI` | JWKS endpoint | `{AUTH0_BASE_URL}/.well-known/jwks.json` |
//! | `NBF_LEEWAY_SECONDS` | Clock tolerance for `exp`/`nbf` | `60` |
//! | `AUTH0_API_REGISTRATION_CLIENT_ID` | Management API client id | Required |
//! | `AUTH0_API_REGISTRATION_CLIENT_SECRET` | Management API client secret | Required |
//! | `AUTH0_API_REGISTRATION_AUDIENCE` | Management API audience | Required |
//! | `AUTH0_API_IDENTIFIER` | API granted to new clients | `datahub-api` |
//! | `APIDATA_SQL_CONNECTION_STRING` | ADO.NET connection string | Unset: in-memory store |
//! | `SQL_CONNECT_MAX_ATTEMPTS` | Connection attempts per request | `3` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;

use url::Url;

use crate::auth::{IssuerInfo, IssuerRegistry, TokenIssuer, DEFAULT_NBF_LEEWAY_SECONDS};
use crate::auth0::Auth0ManagementConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH0_BASE_URL_ENV: &str = "AUTH0_BASE_URL";
pub const AUTH0_CLIENT_ID_ENV: &str = "AUTH0_CLIENT_ID";
pub const AUTH0_AUDIENCE_ENV: &str = "AUTH0_AUDIENCE";
pub const AUTH0_AUDIENCE_CORE_ENV: &str = "AUTH0_AUDIENCE_CORE";
pub const AUTH0_JWKS_URI_ENV: &str = "AUTH0_JWKS_URI";
pub const NBF_LEEWAY_ENV: &str = "NBF_LEEWAY_SECONDS";
pub const REGISTRATION_CLIENT_ID_ENV: &str = "AUTH0_API_REGISTRATION_CLIENT_ID";
pub const REGISTRATION_CLIENT_SECRET_ENV: &str = "AUTH0_API_REGISTRATION_CLIENT_SECRET";
pub const REGISTRATION_AUDIENCE_ENV: &str = "AUTH0_API_REGISTRATION_AUDIENCE";
pub const API_IDENTIFIER_ENV: &str = "AUTH0_API_IDENTIFIER";
pub const SQL_CONNECTION_STRING_ENV: &str = "APIDATA_SQL_CONNECTION_STRING";
pub const SQL_CONNECT_MAX_ATTEMPTS_ENV: &str = "SQL_CONNECT_MAX_ATTEMPTS";

/// Environment variable for the log output format.
///
/// `json` selects JSON lines; anything else selects human-readable output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_IDENTIFIER: &str = "datahub-api";
pub const DEFAULT_SQL_CONNECT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

impl ConfigError {
    fn invalid(name: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Token validation settings for the single supported issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth0TokenConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub jwks_uri: String,
    pub nbf_leeway_seconds: u64,
}

impl Auth0TokenConfig {
    pub fn issuer_registry(&self) -> IssuerRegistry {
        IssuerRegistry::new().with_issuer(
            TokenIssuer::Auth0,
            IssuerInfo::new(
                self.client_id.clone(),
                self.tenant_id.clone(),
                self.jwks_uri.clone(),
            ),
        )
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub token: Auth0TokenConfig,
    pub management: Auth0ManagementConfig,
    /// `None` runs against the in-memory development store.
    pub sql_connection_string: Option<String>,
    pub sql_connect_max_attempts: u32,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to read variables. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.or_default(HOST_ENV, "0.0.0.0");
        let port: u16 = env.parsed(PORT_ENV, 8080)?;
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, e))?;

        let base_url_raw = env.required(AUTH0_BASE_URL_ENV)?;
        let base_url =
            Url::parse(&base_url_raw).map_err(|e| ConfigError::invalid(AUTH0_BASE_URL_ENV, e))?;

        let tenant_id = env
            .optional(AUTH0_AUDIENCE_ENV)
            .or_else(|| env.optional(AUTH0_AUDIENCE_CORE_ENV))
            .ok_or_else(|| ConfigError::Missing(AUTH0_AUDIENCE_ENV.to_string()))?;

        let jwks_uri = env.optional(AUTH0_JWKS_URI_ENV).unwrap_or_else(|| {
            format!(
                "{}/.well-known/jwks.json",
                base_url.as_str().trim_end_matches('/')
            )
        });

        let token = Auth0TokenConfig {
            client_id: env.required(AUTH0_CLIENT_ID_ENV)?,
            tenant_id,
            jwks_uri,
            nbf_leeway_seconds: env.parsed(NBF_LEEWAY_ENV, DEFAULT_NBF_LEEWAY_SECONDS)?,
        };

        let management = Auth0ManagementConfig {
            base_url,
            client_id: env.required(REGISTRATION_CLIENT_ID_ENV)?,
            client_secret: env.required(REGISTRATION_CLIENT_SECRET_ENV)?,
            audience: env.required(REGISTRATION_AUDIENCE_ENV)?,
            api_identifier: env.or_default(API_IDENTIFIER_ENV, DEFAULT_API_IDENTIFIER),
        };

        let sql_connect_max_attempts =
            env.parsed(SQL_CONNECT_MAX_ATTEMPTS_ENV, DEFAULT_SQL_CONNECT_MAX_ATTEMPTS)?;
        if sql_connect_max_attempts == 0 {
            return Err(ConfigError::invalid(
                SQL_CONNECT_MAX_ATTEMPTS_ENV,
                "must be at least 1",
            ));
        }

        Ok(Self {
            bind_addr,
            token,
            management,
            sql_connection_string: env.optional(SQL_CONNECTION_STRING_ENV),
            sql_connect_max_attempts,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.optional(name)
            .ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::invalid(name, e)),
            None => Ok(default),
        }
    }
}
