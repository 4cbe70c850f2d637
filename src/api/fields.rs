// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field list for the calling client.
//!
//! The caller is identified by the `azp` claim of its Auth0 token. The client
//! id is resolved to a registration, and the registration's customer code
//! selects the field list. The SQL connection is opened per request and
//! closed on every path.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use crate::auth::{bearer_token, AuthError, TokenError, TokenIssuer};
use crate::error::ApiError;
use crate::models::FieldRecord;
use crate::state::AppState;
use crate::storage::{close_connection, connect_with_retry, DataHubConnection, StorageResult};

/// Outcome of the two lookups, before it becomes a response.
enum Lookup {
    UnknownClient,
    Fields(Vec<FieldRecord>),
}

/// List the data hub fields configured for the caller's customer.
#[utoipa::path(
    get,
    path = "/api/datahub/fields",
    tag = "DataHub",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Field records for the caller's customer", content_type = "application/json"),
        (status = 401, description = "Missing, invalid or client-less token", body = crate::auth::AuthErrorBody),
        (status = 404, description = "Client ID not found", body = crate::models::ErrorResponse),
        (status = 500, description = "Data hub unavailable", body = crate::models::ErrorResponse)
    )
)]
pub async fn list_fields(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FieldRecord>>, Response> {
    let token = bearer_token(&headers).map_err(IntoResponse::into_response)?;

    let claims = match state.validator.authenticate(token, TokenIssuer::Auth0).await {
        Ok(Some(claims)) => claims,
        Ok(None) => return Err(AuthError::InvalidToken.into_response()),
        Err(TokenError::MissingToken) => return Err(AuthError::MissingAuthHeader.into_response()),
        Err(_) => return Err(AuthError::InvalidToken.into_response()),
    };

    let client_id = claims
        .azp
        .filter(|azp| !azp.trim().is_empty())
        .ok_or_else(|| AuthError::MissingClientId.into_response())?;

    let mut connection = connect_with_retry(state.datahub.as_ref(), &state.retry)
        .await
        .map_err(|e| {
            error!(error = %e, "datahub-connection-error");
            ApiError::internal().into_response()
        })?;

    let lookup = lookup_fields(connection.as_mut(), &client_id).await;
    close_connection(connection).await;

    match lookup {
        Ok(Lookup::Fields(fields)) => Ok(Json(fields)),
        Ok(Lookup::UnknownClient) => {
            Err(ApiError::not_found("Client ID not found").into_response())
        }
        Err(e) => {
            error!(client_id = %client_id, error = %e, "api-registration-error");
            Err(ApiError::internal().into_response())
        }
    }
}

async fn lookup_fields(
    connection: &mut dyn DataHubConnection,
    client_id: &str,
) -> StorageResult<Lookup> {
    let registrations = connection.registrations_by_client_id(client_id).await?;
    let Some(registration) = registrations.into_iter().next() else {
        return Ok(Lookup::UnknownClient);
    };

    let fields = connection
        .fields_by_customer_code(&registration.customer_code)
        .await?;
    info!(
        customer_code = %registration.customer_code,
        rows = fields.len(),
        "datahub-results"
    );
    Ok(Lookup::Fields(fields))
}
