// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_graphql::{Context, Object, Result};

use super::ResolverContext;
use crate::models::{
    ConnectFieldsResult, GenericApiRegistration, Search, Sort, VendorResult,
};
use crate::storage::{
    close_connection, filter_connect_fields, filter_vendors, sort_registrations,
};

pub struct QueryRoot;

#[Object(rename_fields = "PascalCase")]
impl QueryRoot {
    /// A single registration by its code.
    async fn registration_details(
        &self,
        ctx: &Context<'_>,
        app_registration_code: String,
        #[graphql(name = "customerCode")] _customer_code: String,
    ) -> Result<Option<GenericApiRegistration>> {
        let data = ctx.data::<ResolverContext>()?;
        let mut connection = data.connection().await?;
        let result = connection.registration_by_code(&app_registration_code).await;
        close_connection(connection).await;
        Ok(result?)
    }

    /// All registrations of a customer, optionally sorted.
    async fn registrations(
        &self,
        ctx: &Context<'_>,
        customer_code: String,
        sort: Option<Sort>,
    ) -> Result<Vec<GenericApiRegistration>> {
        let data = ctx.data::<ResolverContext>()?;
        let mut connection = data.connection().await?;
        let result = connection.registrations_by_customer_code(&customer_code).await;
        close_connection(connection).await;

        let mut registrations = result?;
        sort_registrations(&mut registrations, sort.as_ref());
        Ok(registrations)
    }

    async fn generic_api_vendors_by_customer_code(
        &self,
        ctx: &Context<'_>,
        customer_code: String,
        search: Option<Search>,
    ) -> Result<VendorResult> {
        let data = ctx.data::<ResolverContext>()?;
        let mut connection = data.connection().await?;
        let result = connection.vendors_by_customer_code(&customer_code).await;
        close_connection(connection).await;

        let vendors = filter_vendors(result?, Search::keyword(search.as_ref()));
        Ok(vendors.into())
    }

    async fn lamp_connect_fields_by_customer_code(
        &self,
        ctx: &Context<'_>,
        customer_code: String,
        search: Option<Search>,
    ) -> Result<ConnectFieldsResult> {
        let data = ctx.data::<ResolverContext>()?;
        let mut connection = data.connection().await?;
        let result = connection
            .connect_fields_by_customer_code(&customer_code)
            .await;
        close_connection(connection).await;

        let fields = filter_connect_fields(result?, Search::keyword(search.as_ref()));
        Ok(fields.into())
    }
}
