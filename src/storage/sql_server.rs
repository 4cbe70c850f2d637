// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SQL Server backend over TDS (`tiberius`).
//!
//! Every call is an `EXEC [apidata].[...]` with named parameters bound
//! positionally. Result rows are turned into JSON objects keyed by column name
//! and then deserialized into the PascalCase models.

use std::borrow::Cow;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use tiberius::{Client, ColumnData, Config, FromSql, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use super::{DataHubConnection, DataHubConnector, StorageError, StorageResult};
use crate::models::{
    ConnectField, FieldRecord, GenericApiRegistration, GenericApiRegistrationInput, Vendor,
};

const SCHEMA: &str = "apidata";

/// Connector configured from an ADO.NET connection string.
#[derive(Clone)]
pub struct SqlServerDataHub {
    config: Config,
}

impl std::fmt::Debug for SqlServerDataHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlServerDataHub")
            .field("addr", &self.config.get_addr())
            .finish()
    }
}

impl SqlServerDataHub {
    /// Parse `Server=tcp:host,1433;Database=...;User ID=...;Password=...`.
    pub fn from_connection_string(connection_string: &str) -> StorageResult<Self> {
        let config = Config::from_ado_string(connection_string)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        Ok(Self { config })
    }

    async fn open(config: Config) -> Result<Client<Compat<TcpStream>>, tiberius::error::Error> {
        let tcp = TcpStream::connect(config.get_addr()).await?;
        tcp.set_nodelay(true)?;
        Client::connect(config, tcp.compat_write()).await
    }
}

#[async_trait]
impl DataHubConnector for SqlServerDataHub {
    async fn connect(&self) -> StorageResult<Box<dyn DataHubConnection>> {
        let client = match Self::open(self.config.clone()).await {
            Ok(client) => client,
            // Azure SQL gateways may redirect to the node hosting the database.
            Err(tiberius::error::Error::Routing { host, port }) => {
                debug!(host = %host, port, "following SQL Server routing redirect");
                let mut config = self.config.clone();
                config.host(&host);
                config.port(port);
                Self::open(config)
                    .await
                    .map_err(|e| StorageError::Connection(e.to_string()))?
            }
            Err(e) => return Err(StorageError::Connection(e.to_string())),
        };

        Ok(Box::new(SqlServerConnection { client }))
    }
}

/// A bound stored procedure parameter.
#[derive(Debug, Clone, PartialEq)]
enum Param {
    Text(Option<String>),
    Flag(Option<bool>),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(Some(value.to_string()))
    }
}

impl From<&Option<String>> for Param {
    fn from(value: &Option<String>) -> Self {
        Param::Text(value.clone())
    }
}

impl From<Option<bool>> for Param {
    fn from(value: Option<bool>) -> Self {
        Param::Flag(value)
    }
}

/// `EXEC [apidata].[proc] @A = @P1, @B = @P2`
fn exec_statement(procedure: &str, names: &[&str]) -> String {
    let args = names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("@{name} = @P{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    if args.is_empty() {
        format!("EXEC [{SCHEMA}].[{procedure}]")
    } else {
        format!("EXEC [{SCHEMA}].[{procedure}] {args}")
    }
}

/// Column parameters shared by add and update.
fn registration_params<'a>(
    code: Option<&str>,
    customer_code: &str,
    client_id: Option<&str>,
    fields: RegistrationColumns<'a>,
    user_code: &str,
) -> Vec<(&'static str, Param)> {
    vec![
        ("AppRegistrationCode", Param::Text(code.map(str::to_string))),
        ("CustomerCode", customer_code.into()),
        ("ClientId", Param::Text(client_id.map(str::to_string))),
        ("AppType", Param::Text(fields.app_type.map(str::to_string))),
        ("AppName", Param::Text(fields.app_name.map(str::to_string))),
        ("ResponseType", fields.response_type.into()),
        ("RequestVendors", fields.request_vendors.into()),
        ("RequestStatuses", fields.request_statuses.into()),
        ("RequestFieldNames", fields.request_field_names.into()),
        ("FeedAddAssets", fields.feed_add_assets.into()),
        ("FeedUpdateCustomFields", fields.feed_update_custom_fields.into()),
        (
            "FeedDefaultPhysicalLocationCode",
            fields.feed_default_physical_location_code.into(),
        ),
        (
            "FeedErrorHandlingPreference",
            fields.feed_error_handling_preference.into(),
        ),
        ("FeedErrorEmailList", fields.feed_error_email_list.into()),
        ("UserCode", user_code.into()),
    ]
}

/// Registration columns that are written as-is by add and update.
struct RegistrationColumns<'a> {
    app_type: Option<&'a str>,
    app_name: Option<&'a str>,
    response_type: &'a Option<String>,
    request_vendors: &'a Option<String>,
    request_statuses: &'a Option<String>,
    request_field_names: &'a Option<String>,
    feed_add_assets: Option<bool>,
    feed_update_custom_fields: Option<bool>,
    feed_default_physical_location_code: &'a Option<String>,
    feed_error_handling_preference: &'a Option<String>,
    feed_error_email_list: &'a Option<String>,
}

impl<'a> From<&'a GenericApiRegistrationInput> for RegistrationColumns<'a> {
    fn from(r: &'a GenericApiRegistrationInput) -> Self {
        Self {
            app_type: Some(&r.app_type),
            app_name: Some(&r.app_name),
            response_type: &r.response_type,
            request_vendors: &r.request_vendors,
            request_statuses: &r.request_statuses,
            request_field_names: &r.request_field_names,
            feed_add_assets: r.feed_add_assets,
            feed_update_custom_fields: r.feed_update_custom_fields,
            feed_default_physical_location_code: &r.feed_default_physical_location_code,
            feed_error_handling_preference: &r.feed_error_handling_preference,
            feed_error_email_list: &r.feed_error_email_list,
        }
    }
}

impl<'a> From<&'a GenericApiRegistration> for RegistrationColumns<'a> {
    fn from(r: &'a GenericApiRegistration) -> Self {
        Self {
            app_type: r.app_type.as_deref(),
            app_name: r.app_name.as_deref(),
            response_type: &r.response_type,
            request_vendors: &r.request_vendors,
            request_statuses: &r.request_statuses,
            request_field_names: &r.request_field_names,
            feed_add_assets: r.feed_add_assets,
            feed_update_custom_fields: r.feed_update_custom_fields,
            feed_default_physical_location_code: &r.feed_default_physical_location_code,
            feed_error_handling_preference: &r.feed_error_handling_preference,
            feed_error_email_list: &r.feed_error_email_list,
        }
    }
}

/// Convert one column value to JSON. Dates become ISO-8601 strings.
fn column_to_json(data: &ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v
            .and_then(|f| Number::from_f64(f64::from(f)))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::F64(v) => v
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| Value::String(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(v) => v
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v
            .map(|n| n.value() as f64 / 10f64.powi(i32::from(n.scale())))
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b: &Cow<'static, [u8]>| Value::from(b.to_vec()))
            .unwrap_or(Value::Null),
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(data)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Time(_) => NaiveTime::from_sql(data)
            .ok()
            .flatten()
            .map(|t| Value::String(t.format("%H:%M:%S%.3f").to_string()))
            .unwrap_or(Value::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)
                .ok()
                .flatten()
                .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn row_to_record(row: &Row) -> FieldRecord {
    row.cells()
        .map(|(column, data)| (column.name().to_string(), column_to_json(data)))
        .collect()
}

fn decode<T: DeserializeOwned>(procedure: &str, records: Vec<FieldRecord>) -> StorageResult<Vec<T>> {
    records
        .into_iter()
        .map(|record| {
            serde_json::from_value(Value::Object(record)).map_err(|source| StorageError::Decode {
                procedure: procedure.to_string(),
                source,
            })
        })
        .collect()
}

struct SqlServerConnection {
    client: Client<Compat<TcpStream>>,
}

impl SqlServerConnection {
    /// Run a stored procedure and return its first result set.
    async fn exec(
        &mut self,
        procedure: &str,
        params: Vec<(&'static str, Param)>,
    ) -> StorageResult<Vec<FieldRecord>> {
        let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        let mut query = Query::new(exec_statement(procedure, &names));
        for (_, param) in params {
            match param {
                Param::Text(value) => query.bind(value),
                Param::Flag(value) => query.bind(value),
            }
        }

        let rows = query
            .query(&mut self.client)
            .await
            .map_err(|e| StorageError::query(procedure, e))?
            .into_first_result()
            .await
            .map_err(|e| StorageError::query(procedure, e))?;

        let records: Vec<FieldRecord> = rows.iter().map(row_to_record).collect();
        info!(
            procedure = %procedure,
            rows = records.len(),
            "datahub-results"
        );
        Ok(records)
    }

    async fn exec_as<T: DeserializeOwned>(
        &mut self,
        procedure: &str,
        params: Vec<(&'static str, Param)>,
    ) -> StorageResult<Vec<T>> {
        let records = self.exec(procedure, params).await?;
        decode(procedure, records)
    }
}

#[async_trait]
impl DataHubConnection for SqlServerConnection {
    async fn registrations_by_client_id(
        &mut self,
        client_id: &str,
    ) -> StorageResult<Vec<GenericApiRegistration>> {
        self.exec_as(
            "Get_AppRegistration_By_ClientId",
            vec![("ClientId", client_id.into())],
        )
        .await
    }

    async fn fields_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<FieldRecord>> {
        self.exec(
            "Get_ListOfFields_By_CustomerCode",
            vec![("CustomerCode", customer_code.into())],
        )
        .await
    }

    async fn registration_by_code(
        &mut self,
        app_registration_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        let rows: Vec<GenericApiRegistration> = self
            .exec_as(
                "Get_AppRegistration_By_Code",
                vec![("AppRegistrationCode", app_registration_code.into())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn registrations_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<GenericApiRegistration>> {
        self.exec_as(
            "Get_AppRegistrations_By_CustomerCode",
            vec![("CustomerCode", customer_code.into())],
        )
        .await
    }

    async fn vendors_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<Vendor>> {
        self.exec_as(
            "Get_GenericApiVendors_By_CustomerCode",
            vec![("CustomerCode", customer_code.into())],
        )
        .await
    }

    async fn connect_fields_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<ConnectField>> {
        self.exec_as(
            "Get_LampConnectFields_By_CustomerCode",
            vec![("CustomerCode", customer_code.into())],
        )
        .await
    }

    async fn add_registration(
        &mut self,
        registration: &GenericApiRegistrationInput,
        client_id: &str,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        let params = registration_params(
            registration.app_registration_code.as_deref(),
            &registration.customer_code,
            Some(client_id),
            registration.into(),
            user_code,
        );
        let rows: Vec<GenericApiRegistration> = self
            .exec_as("Add_GenericApi_AppRegistration", params)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn remove_registration(
        &mut self,
        app_registration_code: &str,
        customer_code: &str,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        let rows: Vec<GenericApiRegistration> = self
            .exec_as(
                "Remove_GenericApi_AppRegistration",
                vec![
                    ("AppRegistrationCode", app_registration_code.into()),
                    ("CustomerCode", customer_code.into()),
                    ("UserCode", user_code.into()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_registration(
        &mut self,
        app_registration_code: &str,
        customer_code: &str,
        registration: &GenericApiRegistration,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        let params = registration_params(
            Some(app_registration_code),
            customer_code,
            registration.client_id.as_deref(),
            registration.into(),
            user_code,
        );
        let rows: Vec<GenericApiRegistration> = self
            .exec_as("Update_GenericApi_AppRegistration", params)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn close(self: Box<Self>) -> StorageResult<()> {
        self.client
            .close()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}
