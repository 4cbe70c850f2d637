// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration mutations.
//!
//! `AddRegistration` runs strictly in order: Auth0 client, then client grant,
//! then the SQL record. A failing step stops the chain. An Auth0 client that
//! was created before a later step failed is left in place.

use async_graphql::{Context, Object, Result};
use serde_json::json;
use tracing::error;

use super::{Actor, ResolverContext, ResolverError};
use crate::auth0::ClientRegistrationDetails;
use crate::models::{GenericApiRegistrationInput, GenericApiRegistrationSecret};
use crate::storage::{close_connection, AuditEvent};

const ADD_LOCATION: &str = "graphql/AddRegistration";
const REMOVE_LOCATION: &str = "graphql/RemoveRegistration";
const UPDATE_LOCATION: &str = "graphql/UpdateRegistration";

pub struct MutationRoot;

#[Object(rename_fields = "PascalCase")]
impl MutationRoot {
    /// Create the Auth0 client and grant, then store the registration.
    ///
    /// The client secret is only ever returned here.
    async fn add_registration(
        &self,
        ctx: &Context<'_>,
        api_registration_config: GenericApiRegistrationInput,
    ) -> Result<Option<GenericApiRegistrationSecret>> {
        let data = ctx.data::<ResolverContext>()?;
        let actor = ctx.data::<Actor>()?;
        let result = add_registration(data, actor, api_registration_config).await;
        Ok(Some(audit_failure(data, actor, ADD_LOCATION, result)?))
    }

    /// Delete the Auth0 client, then remove the registration.
    async fn remove_registration(
        &self,
        ctx: &Context<'_>,
        app_registration_code: String,
        customer_code: String,
    ) -> Result<Option<GenericApiRegistrationSecret>> {
        let data = ctx.data::<ResolverContext>()?;
        let actor = ctx.data::<Actor>()?;
        let result = remove_registration(data, actor, &app_registration_code, &customer_code).await;
        Ok(audit_failure(data, actor, REMOVE_LOCATION, result)?)
    }

    /// Rename the Auth0 client, then store the merged registration.
    async fn update_registration(
        &self,
        ctx: &Context<'_>,
        app_registration_code: String,
        customer_code: String,
        updated_registration_data: GenericApiRegistrationInput,
    ) -> Result<Option<GenericApiRegistrationSecret>> {
        let data = ctx.data::<ResolverContext>()?;
        let actor = ctx.data::<Actor>()?;
        let result = update_registration(
            data,
            actor,
            &app_registration_code,
            &customer_code,
            &updated_registration_data,
        )
        .await;
        Ok(audit_failure(data, actor, UPDATE_LOCATION, result)?)
    }
}

/// Log and audit a failed mutation, passing the result through.
fn audit_failure<T>(
    data: &ResolverContext,
    actor: &Actor,
    location: &str,
    result: Result<T, ResolverError>,
) -> Result<T, ResolverError> {
    if let Err(e) = &result {
        error!(
            location = %location,
            user = %actor.0,
            error = %e,
            "api-registration-error"
        );
        data.audit.record(
            AuditEvent::new(location, e.to_string())
                .with_user(actor.0.as_str())
                .failed(e.to_string()),
        );
    }
    result
}

async fn add_registration(
    data: &ResolverContext,
    actor: &Actor,
    mut registration: GenericApiRegistrationInput,
) -> Result<GenericApiRegistrationSecret, ResolverError> {
    let client = data
        .auth0
        .create_client_registration(ClientRegistrationDetails {
            app_name: &registration.app_name,
            customer_code: &registration.customer_code,
        })
        .await?;

    data.audit.record(
        AuditEvent::new(
            ADD_LOCATION,
            format!("ClientID {} added on auth0", client.client_id),
        )
        .with_user(actor.0.as_str()),
    );

    data.auth0.create_client_grant(&client.client_id).await?;

    if registration
        .app_registration_code
        .as_deref()
        .is_some_and(|c| c.trim().is_empty())
    {
        registration.app_registration_code = None;
    }

    let mut connection = data.connection().await?;
    let stored = connection
        .add_registration(&registration, &client.client_id, &actor.0)
        .await;
    close_connection(connection).await;

    match stored? {
        Some(details) => Ok(GenericApiRegistrationSecret {
            registration_details: details,
            client_secret: client.client_secret,
        }),
        None => Err(ResolverError::NotSaved),
    }
}

async fn remove_registration(
    data: &ResolverContext,
    actor: &Actor,
    app_registration_code: &str,
    customer_code: &str,
) -> Result<Option<GenericApiRegistrationSecret>, ResolverError> {
    let mut connection = data.connection().await?;
    let result = remove_with_connection(
        data,
        actor,
        connection.as_mut(),
        app_registration_code,
        customer_code,
    )
    .await;
    close_connection(connection).await;
    result
}

async fn remove_with_connection(
    data: &ResolverContext,
    actor: &Actor,
    connection: &mut dyn crate::storage::DataHubConnection,
    app_registration_code: &str,
    customer_code: &str,
) -> Result<Option<GenericApiRegistrationSecret>, ResolverError> {
    let existing = connection
        .registration_by_code(app_registration_code)
        .await?
        .ok_or_else(|| ResolverError::RegistrationNotFound(app_registration_code.to_string()))?;
    let client_id = existing
        .client_id
        .as_deref()
        .ok_or_else(|| ResolverError::MissingClientId(app_registration_code.to_string()))?;

    data.auth0.delete_client_registration(client_id).await?;

    data.audit.record(
        AuditEvent::new(
            REMOVE_LOCATION,
            format!("ClientID {client_id} deleted from auth0"),
        )
        .with_user(actor.0.as_str())
        .with_details(json!({ "customerCode": customer_code })),
    );

    let removed = connection
        .remove_registration(app_registration_code, customer_code, &actor.0)
        .await?;

    Ok(removed.map(|details| GenericApiRegistrationSecret {
        registration_details: details,
        client_secret: None,
    }))
}

async fn update_registration(
    data: &ResolverContext,
    actor: &Actor,
    app_registration_code: &str,
    customer_code: &str,
    update: &GenericApiRegistrationInput,
) -> Result<Option<GenericApiRegistrationSecret>, ResolverError> {
    let mut connection = data.connection().await?;
    let result = update_with_connection(
        data,
        actor,
        connection.as_mut(),
        app_registration_code,
        customer_code,
        update,
    )
    .await;
    close_connection(connection).await;
    result
}

async fn update_with_connection(
    data: &ResolverContext,
    actor: &Actor,
    connection: &mut dyn crate::storage::DataHubConnection,
    app_registration_code: &str,
    customer_code: &str,
    update: &GenericApiRegistrationInput,
) -> Result<Option<GenericApiRegistrationSecret>, ResolverError> {
    let existing = connection
        .registration_by_code(app_registration_code)
        .await?
        .ok_or_else(|| ResolverError::RegistrationNotFound(app_registration_code.to_string()))?;
    let client_id = existing
        .client_id
        .as_deref()
        .ok_or_else(|| ResolverError::MissingClientId(app_registration_code.to_string()))?;

    data.auth0
        .update_client_registration(client_id, &update.app_name)
        .await?;

    data.audit.record(
        AuditEvent::new(
            UPDATE_LOCATION,
            format!("ClientID {client_id} updated on auth0"),
        )
        .with_user(actor.0.as_str())
        .with_details(json!({
            "customerCode": customer_code,
            "currentData": existing,
            "newData": update,
        })),
    );

    let merged = existing.merged_with(update);
    let updated = connection
        .update_registration(app_registration_code, customer_code, &merged, &actor.0)
        .await?;

    Ok(updated.map(|details| GenericApiRegistrationSecret {
        registration_details: details,
        client_secret: None,
    }))
}
