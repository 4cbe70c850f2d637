// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Probes. `/health/live` never touches the data hub; `/health` and
//! `/health/ready` open one connection and close it again.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::storage::close_connection;

const OK: &str = "ok";

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessReport {
    /// "ok" or "degraded"
    pub status: String,
    pub checks: DependencyChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DependencyChecks {
    pub service: String,
    /// "ok" or "unavailable"
    pub datahub: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeStatus {
    pub status: String,
}

/// One connection attempt, no retry policy.
async fn datahub_reachable(state: &AppState) -> bool {
    let connection = match state.datahub.connect().await {
        Ok(connection) => connection,
        Err(e) => {
            warn!(error = %e, "datahub-connection-error: probe failed");
            return false;
        }
    };
    close_connection(connection).await;
    true
}

async fn readiness_report(state: &AppState) -> (StatusCode, Json<ReadinessReport>) {
    let reachable = datahub_reachable(state).await;
    let (code, status, datahub) = if reachable {
        (StatusCode::OK, OK, OK)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    let report = ReadinessReport {
        status: status.to_owned(),
        checks: DependencyChecks {
            service: OK.to_owned(),
            datahub: datahub.to_owned(),
        },
    };
    (code, Json(report))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Data hub reachable", body = ReadinessReport),
        (status = 503, description = "Data hub unreachable", body = ReadinessReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    readiness_report(&state).await
}

/// The process is up. Dependencies are not checked.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is running", body = ProbeStatus))
)]
pub async fn liveness() -> Json<ProbeStatus> {
    Json(ProbeStatus {
        status: OK.to_owned(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve field lists", body = ReadinessReport),
        (status = 503, description = "Data hub unreachable", body = ReadinessReport)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    readiness_report(&state).await
}
