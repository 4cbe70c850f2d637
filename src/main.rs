// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use tokio::signal;
use tracing::{error, info, warn};

use datahub_connector::{
    api::router,
    auth::{JwksResolver, TokenValidator},
    auth0::Auth0Accessor,
    config::AppConfig,
    graphql::{build_schema, ResolverContext},
    logging::{self, LogFormat},
    state::AppState,
    storage::{
        DataHubConnector, InMemoryDataHub, RetryPolicy, SqlServerDataHub, TracingAuditSink,
    },
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    logging::init(LogFormat::from_env());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client");

    let datahub: Arc<dyn DataHubConnector> = match &config.sql_connection_string {
        Some(connection_string) => Arc::new(
            SqlServerDataHub::from_connection_string(connection_string)
                .expect("Failed to parse APIDATA_SQL_CONNECTION_STRING"),
        ),
        None => {
            warn!("APIDATA_SQL_CONNECTION_STRING not set, using in-memory data hub");
            Arc::new(InMemoryDataHub::new())
        }
    };

    let retry = RetryPolicy::default().with_max_attempts(config.sql_connect_max_attempts);

    let validator = TokenValidator::new(
        config.token.issuer_registry(),
        Arc::new(JwksResolver::new(http.clone())),
    )
    .with_leeway(config.token.nbf_leeway_seconds);

    let schema = build_schema(ResolverContext {
        datahub: datahub.clone(),
        retry,
        auth0: Auth0Accessor::new(http, &config.management),
        audit: Arc::new(TracingAuditSink),
    });

    let app = router(AppState::new(validator, datahub, retry, schema));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");

    info!(addr = %config.bind_addr, "DataHub connector listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
