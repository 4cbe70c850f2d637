// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Records exchanged with the data hub stored procedures and exposed through
//! GraphQL and the fields endpoint.
//!
//! Field names are PascalCase on the wire (both JSON and GraphQL), matching the
//! column names returned by the stored procedures.
//!
//! ## Model Categories
//!
//! - **Registrations**: generic API app registrations and their Auth0 secret
//! - **Lookups**: vendors and LAMP Connect fields per customer
//! - **Fields**: untyped field records returned by the fields endpoint

use async_graphql::{InputObject, SimpleObject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

// =============================================================================
// Registration Models
// =============================================================================

/// A generic API app registration as stored in the data hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "PascalCase")]
#[graphql(rename_fields = "PascalCase")]
pub struct GenericApiRegistration {
    pub app_registration_code: String,
    pub customer_code: String,
    /// Auth0 client id backing this registration.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub app_type: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub request_vendors: Option<String>,
    #[serde(default)]
    pub request_statuses: Option<String>,
    #[serde(default)]
    pub request_field_names: Option<String>,
    #[serde(default)]
    pub feed_add_assets: Option<bool>,
    #[serde(default)]
    pub feed_update_custom_fields: Option<bool>,
    #[serde(default)]
    pub feed_default_physical_location_code: Option<String>,
    #[serde(default)]
    pub feed_error_handling_preference: Option<String>,
    #[serde(default)]
    pub feed_error_email_list: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub deleted: Option<String>,
    #[serde(default)]
    pub deleted_by: Option<String>,
}

/// Registration data supplied by a caller when adding or updating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, InputObject)]
#[serde(rename_all = "PascalCase")]
#[graphql(rename_fields = "PascalCase")]
pub struct GenericApiRegistrationInput {
    pub app_registration_code: Option<String>,
    pub customer_code: String,
    pub app_type: String,
    pub app_name: String,
    pub response_type: Option<String>,
    pub request_vendors: Option<String>,
    pub request_statuses: Option<String>,
    pub request_field_names: Option<String>,
    pub feed_add_assets: Option<bool>,
    pub feed_update_custom_fields: Option<bool>,
    pub feed_default_physical_location_code: Option<String>,
    pub feed_error_handling_preference: Option<String>,
    pub feed_error_email_list: Option<String>,
    pub created: Option<String>,
    pub created_by: Option<String>,
    pub updated: Option<String>,
    pub updated_by: Option<String>,
    pub deleted: Option<String>,
    pub deleted_by: Option<String>,
}

impl GenericApiRegistration {
    /// Overlay the supplied input on this record.
    ///
    /// Required input fields always replace the stored value. Optional input
    /// fields replace it only when present. `ClientId` is never touched.
    pub fn merged_with(&self, input: &GenericApiRegistrationInput) -> Self {
        fn pick<T: Clone>(new: &Option<T>, old: &Option<T>) -> Option<T> {
            new.clone().or_else(|| old.clone())
        }

        Self {
            app_registration_code: input
                .app_registration_code
                .clone()
                .unwrap_or_else(|| self.app_registration_code.clone()),
            customer_code: input.customer_code.clone(),
            client_id: self.client_id.clone(),
            app_type: Some(input.app_type.clone()),
            app_name: Some(input.app_name.clone()),
            response_type: pick(&input.response_type, &self.response_type),
            request_vendors: pick(&input.request_vendors, &self.request_vendors),
            request_statuses: pick(&input.request_statuses, &self.request_statuses),
            request_field_names: pick(&input.request_field_names, &self.request_field_names),
            feed_add_assets: pick(&input.feed_add_assets, &self.feed_add_assets),
            feed_update_custom_fields: pick(
                &input.feed_update_custom_fields,
                &self.feed_update_custom_fields,
            ),
            feed_default_physical_location_code: pick(
                &input.feed_default_physical_location_code,
                &self.feed_default_physical_location_code,
            ),
            feed_error_handling_preference: pick(
                &input.feed_error_handling_preference,
                &self.feed_error_handling_preference,
            ),
            feed_error_email_list: pick(&input.feed_error_email_list, &self.feed_error_email_list),
            created: pick(&input.created, &self.created),
            created_by: pick(&input.created_by, &self.created_by),
            updated: pick(&input.updated, &self.updated),
            updated_by: pick(&input.updated_by, &self.updated_by),
            deleted: pick(&input.deleted, &self.deleted),
            deleted_by: pick(&input.deleted_by, &self.deleted_by),
        }
    }
}

/// Result of a registration mutation.
///
/// `ClientSecret` is only populated when a new Auth0 client was created.
#[derive(Debug, Clone, PartialEq, Serialize, SimpleObject)]
#[serde(rename_all = "PascalCase")]
#[graphql(rename_fields = "PascalCase")]
pub struct GenericApiRegistrationSecret {
    pub registration_details: GenericApiRegistration,
    pub client_secret: Option<String>,
}

// =============================================================================
// Lookup Models
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "PascalCase")]
#[graphql(name = "GenericApiVendorsByCustomerCode", rename_fields = "PascalCase")]
pub struct Vendor {
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub vendor_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, SimpleObject)]
#[serde(rename_all = "PascalCase")]
#[graphql(name = "LampConnectFieldsByCustomerCode", rename_fields = "PascalCase")]
pub struct ConnectField {
    #[serde(default)]
    pub field_source: Option<String>,
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub field_label: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, SimpleObject)]
pub struct VendorResult {
    pub total: Option<i32>,
    pub source: Vec<Vendor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, SimpleObject)]
pub struct ConnectFieldsResult {
    pub total: Option<i32>,
    pub source: Vec<ConnectField>,
}

impl From<Vec<Vendor>> for VendorResult {
    fn from(source: Vec<Vendor>) -> Self {
        Self {
            total: i32::try_from(source.len()).ok(),
            source,
        }
    }
}

impl From<Vec<ConnectField>> for ConnectFieldsResult {
    fn from(source: Vec<ConnectField>) -> Self {
        Self {
            total: i32::try_from(source.len()).ok(),
            source,
        }
    }
}

/// Ordering requested for registration listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, InputObject)]
pub struct Sort {
    pub field: Option<String>,
    pub direction: Option<String>,
}

/// Keyword filter for lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, InputObject)]
pub struct Search {
    pub keyword: Option<String>,
}

impl Search {
    /// Trimmed keyword, or `None` when absent or blank.
    pub fn keyword(search: Option<&Search>) -> Option<&str> {
        search
            .and_then(|s| s.keyword.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

// =============================================================================
// Field Records
// =============================================================================

/// One row of `Get_ListOfFields_By_CustomerCode`, returned as-is.
pub type FieldRecord = Map<String, Value>;

/// JSON error body for REST responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored() -> GenericApiRegistration {
        GenericApiRegistration {
            app_registration_code: "REG-1".into(),
            customer_code: "ACME".into(),
            client_id: Some("client-1".into()),
            app_type: Some("Feed".into()),
            app_name: Some("Acme Feed".into()),
            response_type: Some("json".into()),
            feed_add_assets: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn registration_reads_pascal_case_columns() {
        let row = json!({
            "AppRegistrationCode": "REG-1",
            "CustomerCode": "ACME",
            "ClientId": "client-1",
            "FeedAddAssets": true,
            "FeedDefaultPhysicalLocationCode": "LOC-9"
        });
        let registration: GenericApiRegistration = serde_json::from_value(row).unwrap();
        assert_eq!(registration.client_id.as_deref(), Some("client-1"));
        assert_eq!(registration.feed_add_assets, Some(true));
        assert_eq!(
            registration.feed_default_physical_location_code.as_deref(),
            Some("LOC-9")
        );
        assert_eq!(registration.app_name, None);
    }

    #[test]
    fn merge_overlays_present_fields_only() {
        let input = GenericApiRegistrationInput {
            customer_code: "ACME".into(),
            app_type: "Feed".into(),
            app_name: "Renamed Feed".into(),
            feed_add_assets: Some(false),
            ..Default::default()
        };

        let merged = stored().merged_with(&input);
        assert_eq!(merged.app_registration_code, "REG-1");
        assert_eq!(merged.client_id.as_deref(), Some("client-1"));
        assert_eq!(merged.app_name.as_deref(), Some("Renamed Feed"));
        assert_eq!(merged.response_type.as_deref(), Some("json"));
        assert_eq!(merged.feed_add_assets, Some(false));
    }

    #[test]
    fn results_count_their_source() {
        let vendors = VendorResult::from(vec![Vendor::default(), Vendor::default()]);
        assert_eq!(vendors.total, Some(2));

        let fields = ConnectFieldsResult::from(Vec::new());
        assert_eq!(fields.total, Some(0));
    }

    #[test]
    fn blank_keyword_is_ignored() {
        let blank = Search {
            keyword: Some("  ".into()),
        };
        assert_eq!(Search::keyword(Some(&blank)), None);
        assert_eq!(Search::keyword(None), None);

        let set = Search {
            keyword: Some(" vend ".into()),
        };
        assert_eq!(Search::keyword(Some(&set)), Some("vend"));
    }
}
