// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DataHub Connector - Auth0 / SQL Server integration service
//!
//! Serves data hub field lists to API clients authenticated with Auth0 tokens,
//! and manages generic API registrations through GraphQL by keeping Auth0
//! clients and the data hub registration records in step.
//!
//! ## Modules
//!
//! - `api` - HTTP routes (Axum): fields endpoint, GraphQL, health, docs
//! - `auth` - Auth0 bearer token validation (JWKS)
//! - `auth0` - Auth0 Management API client registration
//! - `graphql` - Registration queries and mutations
//! - `storage` - Data hub stored procedures (SQL Server or in-memory), audit log

pub mod api;
pub mod auth;
pub mod auth0;
pub mod config;
pub mod error;
pub mod graphql;
pub mod logging;
pub mod models;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;
