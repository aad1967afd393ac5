//! Test application setup utilities
//!
//! Builds the full router with an in-memory audit database and a wiremock
//! server standing in for the hosted data store.

use std::sync::Arc;

use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

use inmo_crm::{
    api,
    config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig, StoreConfig},
    db,
    middleware::Claims,
    services::{SqliteAuditSink, StoreClient},
    AppState,
};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Stands in for the hosted data store; keep it alive for the test
    pub store_mock: MockServer,
    pub tenant_id: Uuid,
}

impl TestApp {
    /// Create a new test application with in-memory audit database and a
    /// fresh wiremock store
    pub async fn new() -> Self {
        let store_mock = MockServer::start().await;
        let config = test_config(&store_mock.uri());

        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let store = Arc::new(StoreClient::new(&config.store).expect("store client"));
        let audit = Arc::new(SqliteAuditSink::new(db.clone()));

        let state = AppState {
            config: config.clone(),
            db,
            store,
            audit,
        };

        let router = Router::new()
            .nest("/api/v1", api::public_routes())
            .nest(
                "/api/v1",
                api::protected_routes().layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    inmo_crm::middleware::auth::auth_middleware,
                )),
            )
            .with_state(state.clone());

        Self {
            router,
            state,
            store_mock,
            tenant_id: Uuid::new_v4(),
        }
    }

    /// Issue a token the way the external auth provider would
    pub fn token(&self, user_id: Uuid, role: &str, modules: Option<Vec<&str>>) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            tenant_id: self.tenant_id.to_string(),
            email: "marta.ruiz@example.com".to_string(),
            role: role.to_string(),
            modules: modules.map(|m| m.iter().map(|s| s.to_string()).collect()),
            team_id: None,
            market: Some("national".to_string()),
            iat: now,
            exp: now + 3600,
            jti: Some(Uuid::new_v4().to_string()),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.state.config.auth.jwt_secret.as_bytes()),
        )
        .expect("Failed to generate test token")
    }

    /// Make a GET request without authentication
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a GET request with a bearer token
    pub async fn get_auth(&self, uri: &str, token: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body and a bearer token
    pub async fn post_json_auth(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: &str,
    ) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with a raw text body and a bearer token
    pub async fn post_text_auth(&self, uri: &str, body: &str, token: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "text/csv")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a PUT request with JSON body and a bearer token
    pub async fn put_json_auth(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: &str,
    ) -> TestResponse {
        self.request(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub body: axum::body::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Forbidden (403)
    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::FORBIDDEN)
    }
}

/// Create a test configuration pointing at the given store URL
pub fn test_config(store_url: &str) -> AppConfig {
    // Unique temp file per test to avoid conflicts
    let db_path = format!(
        "/tmp/inmo_crm_test_{}.db",
        Uuid::new_v4().to_string().replace('-', "")
    );

    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            workers: 1,
            request_timeout_secs: None,
        },
        store: StoreConfig {
            url: store_url.to_string(),
            timeout_secs: 5,
            service_key: None,
        },
        auth: AuthConfig {
            jwt_secret: "test_secret_key_that_is_at_least_32_bytes_long".to_string(),
            leeway_secs: 0,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path),
            max_connections: 1,
            connect_timeout_secs: 30,
        },
        logging: LoggingConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new().await;
        let response = app.get("/api/v1/health").await;
        response.assert_ok();
    }
}
