// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Hub Storage
//!
//! Registration data lives in SQL Server and is only reached through stored
//! procedures in the `[apidata]` schema. This module hides that behind two
//! traits:
//!
//! - [`DataHubConnector`] opens a connection. It is shared by the whole process.
//! - [`DataHubConnection`] is scoped to one request and exposes one method per
//!   stored procedure. Callers must [`close`](DataHubConnection::close) it on
//!   every path, success or failure.
//!
//! ## Backends
//!
//! | Backend | Used when |
//! |---------|-----------|
//! | [`SqlServerDataHub`] | `APIDATA_SQL_CONNECTION_STRING` is set |
//! | [`InMemoryDataHub`] | development without a database, and tests |
//!
//! ## Stored Procedures
//!
//! ```text
//! [apidata].[Get_AppRegistration_By_ClientId]        @ClientId
//! [apidata].[Get_ListOfFields_By_CustomerCode]       @CustomerCode
//! [apidata].[Get_AppRegistration_By_Code]            @AppRegistrationCode
//! [apidata].[Get_AppRegistrations_By_CustomerCode]   @CustomerCode
//! [apidata].[Get_GenericApiVendors_By_CustomerCode]  @CustomerCode
//! [apidata].[Get_LampConnectFields_By_CustomerCode]  @CustomerCode
//! [apidata].[Add_GenericApi_AppRegistration]         registration columns, @UserCode
//! [apidata].[Remove_GenericApi_AppRegistration]      @AppRegistrationCode, @CustomerCode, @UserCode
//! [apidata].[Update_GenericApi_AppRegistration]      registration columns, @UserCode
//! ```
//!
//! Sorting and keyword filtering of lookups happen here, after the rows are
//! read, so both backends behave the same.

pub mod audit;
pub mod error;
pub mod memory;
pub mod retry;
pub mod sql_server;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::models::{
    ConnectField, FieldRecord, GenericApiRegistration, GenericApiRegistrationInput, Sort, Vendor,
};

pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryDataHub;
pub use retry::{connect_with_retry, RetryPolicy};
pub use sql_server::SqlServerDataHub;

/// Opens per-request connections to the data hub.
#[async_trait]
pub trait DataHubConnector: Send + Sync {
    async fn connect(&self) -> StorageResult<Box<dyn DataHubConnection>>;
}

/// One open connection. Each method runs a single stored procedure.
#[async_trait]
pub trait DataHubConnection: Send {
    /// `Get_AppRegistration_By_ClientId`
    async fn registrations_by_client_id(
        &mut self,
        client_id: &str,
    ) -> StorageResult<Vec<GenericApiRegistration>>;

    /// `Get_ListOfFields_By_CustomerCode`, rows returned untouched.
    async fn fields_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<FieldRecord>>;

    /// `Get_AppRegistration_By_Code`
    async fn registration_by_code(
        &mut self,
        app_registration_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>>;

    /// `Get_AppRegistrations_By_CustomerCode`
    async fn registrations_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<GenericApiRegistration>>;

    /// `Get_GenericApiVendors_By_CustomerCode`
    async fn vendors_by_customer_code(&mut self, customer_code: &str)
        -> StorageResult<Vec<Vendor>>;

    /// `Get_LampConnectFields_By_CustomerCode`
    async fn connect_fields_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<ConnectField>>;

    /// `Add_GenericApi_AppRegistration`. Returns the stored record, if any.
    async fn add_registration(
        &mut self,
        registration: &GenericApiRegistrationInput,
        client_id: &str,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>>;

    /// `Remove_GenericApi_AppRegistration`
    async fn remove_registration(
        &mut self,
        app_registration_code: &str,
        customer_code: &str,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>>;

    /// `Update_GenericApi_AppRegistration`
    async fn update_registration(
        &mut self,
        app_registration_code: &str,
        customer_code: &str,
        registration: &GenericApiRegistration,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>>;

    /// Release the connection.
    async fn close(self: Box<Self>) -> StorageResult<()>;
}

/// Close a connection, logging instead of failing.
pub async fn close_connection(connection: Box<dyn DataHubConnection>) {
    if let Err(e) = connection.close().await {
        warn!(error = %e, "datahub-connection-error: failed to close connection");
    }
}

/// Order registrations by a PascalCase column name.
///
/// Unknown columns keep the stored order. `direction` is ascending unless it
/// reads `desc` or `descending` in any case.
pub fn sort_registrations(registrations: &mut [GenericApiRegistration], sort: Option<&Sort>) {
    let Some(field) = sort
        .and_then(|s| s.field.as_deref())
        .map(str::trim)
        .filter(|f| !f.is_empty())
    else {
        return;
    };

    let descending = sort
        .and_then(|s| s.direction.as_deref())
        .map(|d| matches!(d.trim().to_ascii_lowercase().as_str(), "desc" | "descending"))
        .unwrap_or(false);

    let column = |r: &GenericApiRegistration| -> Value {
        serde_json::to_value(r)
            .ok()
            .and_then(|v| v.get(field).cloned())
            .unwrap_or(Value::Null)
    };

    registrations.sort_by(|a, b| {
        let ordering = compare_values(&column(a), &column(b));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn contains_keyword(value: Option<&str>, keyword: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().contains(&keyword.to_lowercase()))
}

/// Keep vendors whose name or code contains `keyword`, case-insensitively.
pub fn filter_vendors(vendors: Vec<Vendor>, keyword: Option<&str>) -> Vec<Vendor> {
    match keyword {
        Some(k) => vendors
            .into_iter()
            .filter(|v| {
                contains_keyword(v.vendor_name.as_deref(), k)
                    || contains_keyword(v.vendor_code.as_deref(), k)
            })
            .collect(),
        None => vendors,
    }
}

/// Keep fields whose name or label contains `keyword`, case-insensitively.
pub fn filter_connect_fields(fields: Vec<ConnectField>, keyword: Option<&str>) -> Vec<ConnectField> {
    match keyword {
        Some(k) => fields
            .into_iter()
            .filter(|f| {
                contains_keyword(f.field_name.as_deref(), k)
                    || contains_keyword(f.field_label.as_deref(), k)
            })
            .collect(),
        None => fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(code: &str, name: Option<&str>) -> GenericApiRegistration {
        GenericApiRegistration {
            app_registration_code: code.into(),
            customer_code: "ACME".into(),
            app_name: name.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn sorts_by_column_and_direction() {
        let mut regs = vec![
            registration("R2", Some("beta")),
            registration("R1", Some("Alpha")),
            registration("R3", None),
        ];

        sort_registrations(
            &mut regs,
            Some(&Sort {
                field: Some("AppName".into()),
                direction: None,
            }),
        );
        let codes: Vec<_> = regs.iter().map(|r| r.app_registration_code.as_str()).collect();
        assert_eq!(codes, ["R1", "R2", "R3"]);

        sort_registrations(
            &mut regs,
            Some(&Sort {
                field: Some("AppRegistrationCode".into()),
                direction: Some("DESC".into()),
            }),
        );
        let codes: Vec<_> = regs.iter().map(|r| r.app_registration_code.as_str()).collect();
        assert_eq!(codes, ["R3", "R2", "R1"]);
    }

    #[test]
    fn missing_sort_keeps_order() {
        let mut regs = vec![registration("R2", None), registration("R1", None)];
        sort_registrations(&mut regs, None);
        assert_eq!(regs[0].app_registration_code, "R2");
    }

    #[test]
    fn filters_vendors_by_name_or_code() {
        let vendors = vec![
            Vendor {
                vendor_name: Some("Northwind Parts".into()),
                vendor_code: Some("NW".into()),
            },
            Vendor {
                vendor_name: Some("Contoso".into()),
                vendor_code: Some("CTS".into()),
            },
        ];

        let hits = filter_vendors(vendors.clone(), Some("north"));
        assert_eq!(hits.len(), 1);
        assert_eq!(filter_vendors(vendors.clone(), Some("cts")).len(), 1);
        assert_eq!(filter_vendors(vendors, None).len(), 2);
    }

    #[test]
    fn filters_connect_fields_by_label() {
        let fields = vec![ConnectField {
            field_name: Some("serial_no".into()),
            field_label: Some("Serial Number".into()),
            ..Default::default()
        }];
        assert_eq!(filter_connect_fields(fields.clone(), Some("number")).len(), 1);
        assert!(filter_connect_fields(fields, Some("asset")).is_empty());
    }
}
