//! Wiremock endpoints for the hosted data store
//!
//! The store client talks plain HTTPS+JSON, so a wiremock server stands in
//! for the whole hosted service.

use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inmo_crm::models::Lead;

/// Mount a lead listing for GET /v1/leads
pub async fn mock_list_leads(server: &MockServer, leads: &[Lead]) {
    Mock::given(method("GET"))
        .and(path("/v1/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(leads))
        .mount(server)
        .await;
}

/// Mount a successful status update for PUT /v1/leads/{id}/status,
/// asserting it is called exactly `expected_calls` times
pub async fn mock_update_status(server: &MockServer, lead_id: Uuid, expected_calls: u64) {
    Mock::given(method("PUT"))
        .and(path(format!("/v1/leads/{}/status", lead_id)))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount a failing status update for PUT /v1/leads/{id}/status
pub async fn mock_update_status_failure(server: &MockServer, lead_id: Uuid) {
    Mock::given(method("PUT"))
        .and(path(format!("/v1/leads/{}/status", lead_id)))
        .respond_with(ResponseTemplate::new(500).set_body_string("store unavailable"))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount the store health probe
pub async fn mock_store_health(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}
