// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Data hub storage errors.

/// Errors raised by the data hub store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The connection string could not be parsed.
    #[error("Invalid connection configuration: {0}")]
    Config(String),

    /// Opening a connection failed. Retried by `connect_with_retry`.
    #[error("SQL connection failed: {0}")]
    Connection(String),

    /// A stored procedure call failed.
    #[error("Stored procedure {procedure} failed: {message}")]
    Query { procedure: String, message: String },

    /// A row could not be mapped onto its model.
    #[error("Failed to read {procedure} result: {source}")]
    Decode {
        procedure: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorageError {
    pub fn query(procedure: &str, message: impl ToString) -> Self {
        Self::Query {
            procedure: procedure.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_are_transient() {
        assert!(StorageError::Connection("refused".into()).is_transient());
        assert!(!StorageError::query("Get_AppRegistration_By_Code", "timeout").is_transient());
        assert!(!StorageError::Config("bad".into()).is_transient());
    }

    #[test]
    fn query_error_names_procedure() {
        let err = StorageError::query("Get_ListOfFields_By_CustomerCode", "deadlock");
        assert_eq!(
            err.to_string(),
            "Stored procedure Get_ListOfFields_By_CustomerCode failed: deadlock"
        );
    }
}
