// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Auth0 Management API
//!
//! Client registration against the Auth0 Management API:
//!
//! - [`ManagementTokenProvider`] exchanges the registration client's
//!   credentials for a management token, once per outbound call.
//! - [`Auth0Accessor`] creates, grants, renames and deletes clients, and reads
//!   users and connections.

mod accessor;
mod error;
mod management;
mod types;

pub use accessor::Auth0Accessor;
pub use error::Auth0Error;
pub use management::ManagementTokenProvider;
pub use types::{
    Auth0Client, Auth0Connection, Auth0ManagementConfig, Auth0UserInformation, ClientGrant,
    ClientRegistrationDetails, ManagementToken,
};
