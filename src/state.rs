// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenValidator;
use crate::graphql::DataHubSchema;
use crate::storage::{DataHubConnector, RetryPolicy};

/// Shared, read-only application state. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<TokenValidator>,
    pub datahub: Arc<dyn DataHubConnector>,
    pub retry: RetryPolicy,
    pub schema: DataHubSchema,
}

impl AppState {
    pub fn new(
        validator: TokenValidator,
        datahub: Arc<dyn DataHubConnector>,
        retry: RetryPolicy,
        schema: DataHubSchema,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            datahub,
            retry,
            schema,
        }
    }
}

/// Handles onto the in-memory collaborators behind a test [`AppState`].
#[cfg(test)]
pub struct TestHandles {
    pub store: crate::storage::InMemoryDataHub,
    pub audit: Arc<crate::storage::MemoryAuditSink>,
}

/// State wired to the static test key, an in-memory store and an Auth0
/// management API that is never reachable.
#[cfg(test)]
pub fn test_state() -> (AppState, TestHandles) {
    test_state_with_auth0("http://127.0.0.1:9")
}

/// Like [`test_state`], with the management API at `auth0_base`.
#[cfg(test)]
pub fn test_state_with_auth0(auth0_base: &str) -> (AppState, TestHandles) {
    use crate::test_support::{resolver_context, test_registry, StaticKeyResolver};

    let (context, store, audit) = resolver_context(auth0_base);
    let state = AppState::new(
        TokenValidator::new(test_registry(), Arc::new(StaticKeyResolver)),
        context.datahub.clone(),
        context.retry,
        crate::graphql::build_schema(context),
    );
    (state, TestHandles { store, audit })
}
