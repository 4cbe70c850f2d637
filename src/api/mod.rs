// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::health::{DependencyChecks, ProbeStatus, ReadinessReport},
    auth::AuthErrorBody,
    models::ErrorResponse,
    state::AppState,
};

pub mod fields;
pub mod graphql;
pub mod health;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/api/datahub/fields", get(fields::list_fields))
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        fields::list_fields,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ErrorResponse,
            AuthErrorBody,
            ReadinessReport,
            DependencyChecks,
            ProbeStatus
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "DataHub", description = "Field lists for registered API clients"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _) = test_state();
        let _ = router(state).into_make_service();
    }

    #[tokio::test]
    async fn openapi_lists_rest_routes() {
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/api-doc/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/api/datahub/fields"]["get"].is_object());
        assert!(doc["paths"]["/health/ready"]["get"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
