// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # GraphQL API
//!
//! Generic API registration queries and mutations.
//!
//! Field names are PascalCase (`RegistrationDetails`, `AppRegistrationCode`);
//! arguments are camelCase (`appRegistrationCode`). Queries read straight from
//! the data hub. Mutations keep Auth0 and the data hub in step and record
//! every change and every failure in the audit log under the caller's
//! identity, which the HTTP layer attaches to each request as an [`Actor`].

mod mutation;
mod query;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Schema};

use crate::auth0::{Auth0Accessor, Auth0Error};
use crate::storage::{
    connect_with_retry, AuditSink, DataHubConnection, DataHubConnector, RetryPolicy, StorageError,
};

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type DataHubSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// The authenticated caller (`CurrentUserCode`), taken from the token's `sub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

/// Collaborators shared by all resolvers.
#[derive(Clone)]
pub struct ResolverContext {
    pub datahub: Arc<dyn DataHubConnector>,
    pub retry: RetryPolicy,
    pub auth0: Auth0Accessor,
    pub audit: Arc<dyn AuditSink>,
}

impl ResolverContext {
    async fn connection(&self) -> Result<Box<dyn DataHubConnection>, ResolverError> {
        Ok(connect_with_retry(self.datahub.as_ref(), &self.retry).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth0(#[from] Auth0Error),

    #[error("Registration {0} was not found.")]
    RegistrationNotFound(String),

    #[error("Registration {0} has no Auth0 client id.")]
    MissingClientId(String),

    #[error("Failed to save registration to SQL.")]
    NotSaved,
}

pub fn build_schema(context: ResolverContext) -> DataHubSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(context)
        .finish()
}
