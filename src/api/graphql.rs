// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{extract::State, response::Html};

use crate::auth::Auth;
use crate::graphql::Actor;
use crate::state::AppState;

/// Execute a GraphQL request as the authenticated caller.
pub async fn graphql_handler(
    State(state): State<AppState>,
    Auth(user): Auth,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let request = request.into_inner().data(Actor(user.user_code));
    state.schema.execute(request).await.into()
}

/// GraphiQL IDE. Queries sent from it still need a bearer token.
pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::state::{test_state, test_state_with_auth0};
    use crate::test_support::{mint_token, stored_registration, valid_claims};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn graphql_request(authorization: Option<&str>, query: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder
            .body(Body::from(json!({ "query": query }).to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn graphql_requires_bearer_token() {
        let (state, handles) = test_state();

        let response = router(state)
            .oneshot(graphql_request(
                None,
                r#"{ Registrations(customerCode: "ACME") { AppRegistrationCode } }"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(handles.store.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn graphql_query_with_valid_token() {
        let (state, handles) = test_state();
        handles
            .store
            .insert_registration(stored_registration("REG-1", "client-1"))
            .await;
        let token = mint_token(&valid_claims());

        let response = router(state)
            .oneshot(graphql_request(
                Some(&format!("Bearer {token}")),
                r#"{ Registrations(customerCode: "ACME") { AppRegistrationCode ClientId } }"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "data": { "Registrations": [
                { "AppRegistrationCode": "REG-1", "ClientId": "client-1" }
            ]}})
        );
    }

    #[tokio::test]
    async fn mutation_audit_records_token_subject() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"mgmt-token"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/api/v2/clients/client-1")
            .with_status(204)
            .create_async()
            .await;

        let (state, handles) = test_state_with_auth0(&server.url());
        handles
            .store
            .insert_registration(stored_registration("REG-1", "client-1"))
            .await;
        let token = mint_token(&valid_claims());

        let response = router(state)
            .oneshot(graphql_request(
                Some(&format!("Bearer {token}")),
                r#"mutation { RemoveRegistration(appRegistrationCode: "REG-1", customerCode: "ACME") { ClientSecret } }"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let events = handles.audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].user.as_deref(),
            Some(format!("{}@clients", crate::test_support::TEST_CLIENT_ID).as_str())
        );
    }

    #[tokio::test]
    async fn graphiql_is_served() {
        let (state, _handles) = test_state();
        let response = router(state)
            .oneshot(Request::builder().uri("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
