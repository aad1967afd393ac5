//! Store adapter tests
//!
//! The client is the only place store wire JSON is parsed, so these tests
//! pin the decoding and the idempotency behavior of the status update.

use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inmo_crm::config::StoreConfig;
use inmo_crm::models::{LeadQuery, PipelineStage};
use inmo_crm::services::StoreClient;

use crate::common::{lead_factory, mock_list_leads, mock_update_status};

fn client_for(server: &MockServer) -> StoreClient {
    StoreClient::new(&StoreConfig {
        url: server.uri(),
        timeout_secs: 5,
        service_key: None,
    })
    .expect("store client")
}

#[tokio::test]
async fn test_update_status_success() {
    let server = MockServer::start().await;
    let lead_id = Uuid::new_v4();
    mock_update_status(&server, lead_id, 1).await;

    let client = client_for(&server);
    client
        .update_lead_status(lead_id, PipelineStage::Contacted)
        .await
        .expect("status update");
}

#[tokio::test]
async fn test_update_status_is_idempotent_under_retry() {
    let server = MockServer::start().await;
    let lead_id = Uuid::new_v4();
    mock_update_status(&server, lead_id, 2).await;

    let client = client_for(&server);
    for _ in 0..2 {
        client
            .update_lead_status(lead_id, PipelineStage::Offer)
            .await
            .expect("status update");
    }
}

#[tokio::test]
async fn test_update_status_conflict_treated_as_success() {
    let server = MockServer::start().await;
    let lead_id = Uuid::new_v4();
    Mock::given(method("PUT"))
        .and(path(format!("/v1/leads/{}/status", lead_id)))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let client = client_for(&server);
    // The store rejecting an already-applied stage is not an error here
    client
        .update_lead_status(lead_id, PipelineStage::Qualified)
        .await
        .expect("conflict is a no-op");
}

#[tokio::test]
async fn test_update_status_server_error_propagates() {
    let server = MockServer::start().await;
    let lead_id = Uuid::new_v4();
    Mock::given(method("PUT"))
        .and(path(format!("/v1/leads/{}/status", lead_id)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client
        .update_lead_status(lead_id, PipelineStage::Qualified)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_leads_decodes_typed_rows() {
    let server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();
    let leads = vec![
        lead_factory(tenant_id, PipelineStage::New),
        lead_factory(tenant_id, PipelineStage::ClosedWon),
    ];
    mock_list_leads(&server, &leads).await;

    let client = client_for(&server);
    let fetched = client
        .list_leads(tenant_id, &LeadQuery::default())
        .await
        .expect("list leads");

    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[0].name, "Ana Torres");
    assert_eq!(fetched[1].stage, PipelineStage::ClosedWon);
}

#[tokio::test]
async fn test_get_lead_not_found_is_none() {
    let server = MockServer::start().await;
    let tenant_id = Uuid::new_v4();
    let lead_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/v1/leads/{}", lead_id)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let lead = client.get_lead(tenant_id, lead_id).await.expect("get lead");
    assert!(lead.is_none());
}
