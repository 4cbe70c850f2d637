// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory data hub for development and tests.
//!
//! Mirrors the stored procedure behavior closely enough for the HTTP and
//! GraphQL layers: lookups, add with audit columns, soft-delete style remove
//! and full-record update. Connection open/close counts and injected failures
//! make the per-request connection lifecycle observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DataHubConnection, DataHubConnector, StorageError, StorageResult};
use crate::models::{
    ConnectField, FieldRecord, GenericApiRegistration, GenericApiRegistrationInput, Vendor,
};

#[derive(Default)]
struct Tables {
    registrations: Vec<GenericApiRegistration>,
    fields: HashMap<String, Vec<FieldRecord>>,
    vendors: HashMap<String, Vec<Vendor>>,
    connect_fields: HashMap<String, Vec<ConnectField>>,
}

#[derive(Default)]
struct Shared {
    tables: RwLock<Tables>,
    connect_attempts: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    failing_connects: AtomicU32,
    failing_queries: AtomicBool,
    skip_add_result: AtomicBool,
}

/// Data hub held entirely in process memory.
#[derive(Clone, Default)]
pub struct InMemoryDataHub {
    shared: Arc<Shared>,
}

impl InMemoryDataHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_registration(&self, registration: GenericApiRegistration) {
        self.shared
            .tables
            .write()
            .await
            .registrations
            .push(registration);
    }

    pub async fn insert_fields(&self, customer_code: &str, fields: Vec<FieldRecord>) {
        self.shared
            .tables
            .write()
            .await
            .fields
            .insert(customer_code.to_string(), fields);
    }

    pub async fn insert_vendors(&self, customer_code: &str, vendors: Vec<Vendor>) {
        self.shared
            .tables
            .write()
            .await
            .vendors
            .insert(customer_code.to_string(), vendors);
    }

    pub async fn insert_connect_fields(&self, customer_code: &str, fields: Vec<ConnectField>) {
        self.shared
            .tables
            .write()
            .await
            .connect_fields
            .insert(customer_code.to_string(), fields);
    }

    /// Snapshot of all live registrations.
    pub async fn registrations(&self) -> Vec<GenericApiRegistration> {
        self.shared.tables.read().await.registrations.clone()
    }

    /// Make the next `count` connection attempts fail with a connection error.
    pub fn fail_next_connects(&self, count: u32) {
        self.shared.failing_connects.store(count, Ordering::SeqCst);
    }

    /// Make every stored procedure call fail until reset.
    pub fn fail_queries(&self, failing: bool) {
        self.shared.failing_queries.store(failing, Ordering::SeqCst);
    }

    /// Make `add_registration` store nothing and return no record.
    pub fn skip_add_result(&self, skip: bool) {
        self.shared.skip_add_result.store(skip, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> usize {
        self.shared.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataHubConnector for InMemoryDataHub {
    async fn connect(&self) -> StorageResult<Box<dyn DataHubConnection>> {
        self.shared.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self.shared.failing_connects.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |n| n.checked_sub(1),
        );
        if failing.is_ok() {
            return Err(StorageError::Connection(
                "in-memory connection refused".to_string(),
            ));
        }

        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryConnection {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct InMemoryConnection {
    shared: Arc<Shared>,
}

impl InMemoryConnection {
    fn check(&self, procedure: &str) -> StorageResult<()> {
        if self.shared.failing_queries.load(Ordering::SeqCst) {
            return Err(StorageError::query(procedure, "injected failure"));
        }
        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[async_trait]
impl DataHubConnection for InMemoryConnection {
    async fn registrations_by_client_id(
        &mut self,
        client_id: &str,
    ) -> StorageResult<Vec<GenericApiRegistration>> {
        self.check("Get_AppRegistration_By_ClientId")?;
        let tables = self.shared.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .filter(|r| r.client_id.as_deref() == Some(client_id))
            .cloned()
            .collect())
    }

    async fn fields_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<FieldRecord>> {
        self.check("Get_ListOfFields_By_CustomerCode")?;
        let tables = self.shared.tables.read().await;
        Ok(tables.fields.get(customer_code).cloned().unwrap_or_default())
    }

    async fn registration_by_code(
        &mut self,
        app_registration_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        self.check("Get_AppRegistration_By_Code")?;
        let tables = self.shared.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .find(|r| r.app_registration_code == app_registration_code)
            .cloned())
    }

    async fn registrations_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<GenericApiRegistration>> {
        self.check("Get_AppRegistrations_By_CustomerCode")?;
        let tables = self.shared.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .filter(|r| r.customer_code == customer_code)
            .cloned()
            .collect())
    }

    async fn vendors_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<Vendor>> {
        self.check("Get_GenericApiVendors_By_CustomerCode")?;
        let tables = self.shared.tables.read().await;
        Ok(tables.vendors.get(customer_code).cloned().unwrap_or_default())
    }

    async fn connect_fields_by_customer_code(
        &mut self,
        customer_code: &str,
    ) -> StorageResult<Vec<ConnectField>> {
        self.check("Get_LampConnectFields_By_CustomerCode")?;
        let tables = self.shared.tables.read().await;
        Ok(tables
            .connect_fields
            .get(customer_code)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_registration(
        &mut self,
        registration: &GenericApiRegistrationInput,
        client_id: &str,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        self.check("Add_GenericApi_AppRegistration")?;
        if self.shared.skip_add_result.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let code = registration
            .app_registration_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let stored = GenericApiRegistration {
            app_registration_code: code,
            client_id: Some(client_id.to_string()),
            created: Some(timestamp()),
            created_by: Some(user_code.to_string()),
            ..GenericApiRegistration::default()
        }
        .merged_with(&GenericApiRegistrationInput {
            app_registration_code: None,
            ..registration.clone()
        });

        let mut tables = self.shared.tables.write().await;
        tables.registrations.push(stored.clone());
        Ok(Some(stored))
    }

    async fn remove_registration(
        &mut self,
        app_registration_code: &str,
        customer_code: &str,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        self.check("Remove_GenericApi_AppRegistration")?;
        let mut tables = self.shared.tables.write().await;
        let position = tables.registrations.iter().position(|r| {
            r.app_registration_code == app_registration_code && r.customer_code == customer_code
        });

        Ok(position.map(|index| {
            let mut removed = tables.registrations.remove(index);
            removed.deleted = Some(timestamp());
            removed.deleted_by = Some(user_code.to_string());
            removed
        }))
    }

    async fn update_registration(
        &mut self,
        app_registration_code: &str,
        customer_code: &str,
        registration: &GenericApiRegistration,
        user_code: &str,
    ) -> StorageResult<Option<GenericApiRegistration>> {
        self.check("Update_GenericApi_AppRegistration")?;
        let mut tables = self.shared.tables.write().await;
        let Some(existing) = tables.registrations.iter_mut().find(|r| {
            r.app_registration_code == app_registration_code && r.customer_code == customer_code
        }) else {
            return Ok(None);
        };

        *existing = GenericApiRegistration {
            app_registration_code: app_registration_code.to_string(),
            updated: Some(timestamp()),
            updated_by: Some(user_code.to_string()),
            ..registration.clone()
        };
        Ok(Some(existing.clone()))
    }

    async fn close(self: Box<Self>) -> StorageResult<()> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> GenericApiRegistrationInput {
        GenericApiRegistrationInput {
            customer_code: "ACME".into(),
            app_type: "Feed".into(),
            app_name: "Acme Feed".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn counts_open_and_close() {
        let store = InMemoryDataHub::new();
        let connection = store.connect().await.unwrap();
        assert_eq!((store.opened(), store.closed()), (1, 0));

        connection.close().await.unwrap();
        assert_eq!((store.opened(), store.closed()), (1, 1));
    }

    #[tokio::test]
    async fn add_then_lookup_by_client_id() {
        let store = InMemoryDataHub::new();
        let mut connection = store.connect().await.unwrap();

        let added = connection
            .add_registration(&input(), "client-9", "user-1")
            .await
            .unwrap()
            .expect("record stored");
        assert_eq!(added.client_id.as_deref(), Some("client-9"));
        assert_eq!(added.created_by.as_deref(), Some("user-1"));
        assert_eq!(added.app_name.as_deref(), Some("Acme Feed"));
        assert!(!added.app_registration_code.is_empty());

        let found = connection
            .registrations_by_client_id("client-9")
            .await
            .unwrap();
        assert_eq!(found, vec![added]);
    }

    #[tokio::test]
    async fn remove_requires_matching_customer() {
        let store = InMemoryDataHub::new();
        store
            .insert_registration(GenericApiRegistration {
                app_registration_code: "REG-1".into(),
                customer_code: "ACME".into(),
                ..Default::default()
            })
            .await;
        let mut connection = store.connect().await.unwrap();

        let wrong = connection
            .remove_registration("REG-1", "OTHER", "user-1")
            .await
            .unwrap();
        assert!(wrong.is_none());

        let removed = connection
            .remove_registration("REG-1", "ACME", "user-1")
            .await
            .unwrap()
            .expect("removed");
        assert_eq!(removed.deleted_by.as_deref(), Some("user-1"));
        assert!(store.registrations().await.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_record_and_stamps_user() {
        let store = InMemoryDataHub::new();
        store
            .insert_registration(GenericApiRegistration {
                app_registration_code: "REG-1".into(),
                customer_code: "ACME".into(),
                app_name: Some("Old".into()),
                ..Default::default()
            })
            .await;
        let mut connection = store.connect().await.unwrap();

        let replacement = GenericApiRegistration {
            app_registration_code: "REG-1".into(),
            customer_code: "ACME".into(),
            app_name: Some("New".into()),
            ..Default::default()
        };
        let updated = connection
            .update_registration("REG-1", "ACME", &replacement, "user-2")
            .await
            .unwrap()
            .expect("updated");
        assert_eq!(updated.app_name.as_deref(), Some("New"));
        assert_eq!(updated.updated_by.as_deref(), Some("user-2"));
    }

    #[tokio::test]
    async fn injected_query_failure_names_procedure() {
        let store = InMemoryDataHub::new();
        store.fail_queries(true);
        let mut connection = store.connect().await.unwrap();

        let err = connection.fields_by_customer_code("ACME").await.unwrap_err();
        assert!(err.to_string().contains("Get_ListOfFields_By_CustomerCode"));
    }
}
