//! Pipeline move endpoint tests
//!
//! Drag scenarios driven through the HTTP surface: a drop on a column
//! persists and keeps the new stage; a failing store rolls the board back
//! and surfaces exactly one notification; a same-column drop never reaches
//! the store.

use uuid::Uuid;

use inmo_crm::models::PipelineStage;

use crate::common::{
    lead_factory, mock_list_leads, mock_update_status, mock_update_status_failure, TestApp,
};

#[tokio::test]
async fn test_move_new_to_contacted_persists() {
    let app = TestApp::new().await;
    let lead = lead_factory(app.tenant_id, PipelineStage::New);
    mock_list_leads(&app.store_mock, &[lead.clone()]).await;
    mock_update_status(&app.store_mock, lead.id, 1).await;

    let token = app.token(Uuid::new_v4(), "admin", None);
    let response = app
        .post_json_auth(
            "/api/v1/pipeline/move",
            serde_json::json!({ "lead_id": lead.id, "target": "contacted" }),
            &token,
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["outcome"], "committed");
    assert_eq!(json["stage"], "contacted");
    assert_eq!(json["notifications"].as_array().unwrap().len(), 0);

    // The lead renders in its new column
    let contacted = json["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["stage"] == "contacted")
        .expect("contacted column");
    assert_eq!(contacted["leads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_move_rolls_back_on_store_failure() {
    let app = TestApp::new().await;
    let lead = lead_factory(app.tenant_id, PipelineStage::New);
    mock_list_leads(&app.store_mock, &[lead.clone()]).await;
    mock_update_status_failure(&app.store_mock, lead.id).await;

    let token = app.token(Uuid::new_v4(), "admin", None);
    let response = app
        .post_json_auth(
            "/api/v1/pipeline/move",
            serde_json::json!({ "lead_id": lead.id, "target": "contacted" }),
            &token,
        )
        .await;

    // A persistence failure is not a server error: the board reverted
    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["outcome"], "rolled_back");
    assert_eq!(json["stage"], "new");

    // Exactly one user-visible notification
    let notifications = json["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["level"], "error");

    // The lead is back in its original column
    let new_column = json["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["stage"] == "new")
        .expect("new column");
    assert_eq!(new_column["leads"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_column_drop_makes_no_store_call() {
    let app = TestApp::new().await;
    let lead = lead_factory(app.tenant_id, PipelineStage::Qualified);
    mock_list_leads(&app.store_mock, &[lead.clone()]).await;
    // expect(0): the mock server fails the test on any status-update call
    mock_update_status(&app.store_mock, lead.id, 0).await;

    let token = app.token(Uuid::new_v4(), "admin", None);
    let response = app
        .post_json_auth(
            "/api/v1/pipeline/move",
            serde_json::json!({ "lead_id": lead.id, "target": "qualified" }),
            &token,
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["outcome"], "unchanged");
    assert_eq!(json["notifications"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_drop_on_card_takes_that_cards_stage() {
    let app = TestApp::new().await;
    let dragged = lead_factory(app.tenant_id, PipelineStage::New);
    let target = lead_factory(app.tenant_id, PipelineStage::Offer);
    mock_list_leads(&app.store_mock, &[dragged.clone(), target.clone()]).await;
    mock_update_status(&app.store_mock, dragged.id, 1).await;

    let token = app.token(Uuid::new_v4(), "admin", None);
    let response = app
        .post_json_auth(
            "/api/v1/pipeline/move",
            serde_json::json!({ "lead_id": dragged.id, "target": target.id }),
            &token,
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["outcome"], "committed");
    assert_eq!(json["stage"], "offer");
}

#[tokio::test]
async fn test_unresolved_drop_target_is_ignored() {
    let app = TestApp::new().await;
    let lead = lead_factory(app.tenant_id, PipelineStage::New);
    mock_list_leads(&app.store_mock, &[lead.clone()]).await;
    mock_update_status(&app.store_mock, lead.id, 0).await;

    let token = app.token(Uuid::new_v4(), "admin", None);
    let response = app
        .post_json_auth(
            "/api/v1/pipeline/move",
            serde_json::json!({ "lead_id": lead.id, "target": "trash" }),
            &token,
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["outcome"], "ignored");
}

#[tokio::test]
async fn test_board_hides_empty_terminal_columns() {
    let app = TestApp::new().await;
    let leads = vec![
        lead_factory(app.tenant_id, PipelineStage::New),
        lead_factory(app.tenant_id, PipelineStage::ClosedWon),
    ];
    mock_list_leads(&app.store_mock, &leads).await;

    let token = app.token(Uuid::new_v4(), "admin", None);
    let response = app.get_auth("/api/v1/pipeline/board", &token).await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    let stages: Vec<&str> = json["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["stage"].as_str().unwrap())
        .collect();

    // Seven non-terminal columns plus the occupied closed-won one
    assert_eq!(stages.len(), 8);
    assert!(stages.contains(&"closed-won"));
    assert!(!stages.contains(&"closed-lost"));
    assert!(!stages.contains(&"dormant"));
}

#[tokio::test]
async fn test_backoffice_cannot_move_leads() {
    let app = TestApp::new().await;

    let token = app.token(Uuid::new_v4(), "backoffice", None);
    let response = app
        .post_json_auth(
            "/api/v1/pipeline/move",
            serde_json::json!({ "lead_id": Uuid::new_v4(), "target": "contacted" }),
            &token,
        )
        .await;

    response.assert_forbidden();
}
