// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for registration changes.
//!
//! Every Auth0 client creation, rename and deletion is recorded with the acting
//! user, as is every failed mutation. Events go to an [`AuditSink`]; the
//! production sink writes them as structured `tracing` events under the
//! `audit` target so they can be routed separately from application logs.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Application name stamped on every event.
pub const AUDIT_APPLICATION: &str = "LAMP DataHub Connector";

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    pub application: String,
    /// Operation that produced the event, e.g. `graphql/AddRegistration`.
    pub location: String,
    pub message: String,
    /// User who triggered the event (if known).
    pub user: Option<String>,
    /// Additional details as JSON.
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new successful audit event.
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            application: AUDIT_APPLICATION.to_string(),
            location: location.into(),
            message: message.into(),
            user: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the acting user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Destination for audit events. Recording never fails the caller.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes events as `tracing` records under the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let details = event
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let user = event.user.as_deref().unwrap_or_default();

        if event.success {
            info!(
                target: "audit",
                event_id = %event.event_id,
                application = %event.application,
                location = %event.location,
                user = %user,
                details = %details,
                "{}",
                event.message
            );
        } else {
            error!(
                target: "audit",
                event_id = %event.event_id,
                application = %event.application,
                location = %event.location,
                user = %user,
                details = %details,
                error = event.error.as_deref().unwrap_or_default(),
                "{}",
                event.message
            );
        }
    }
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
