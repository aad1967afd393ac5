//! API integration tests
//!
//! Authentication, permission gating, scope narrowing and the audit trail,
//! exercised through real requests against the assembled router.

use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use inmo_crm::models::PipelineStage;

use crate::common::{
    lead_factory, mock_store_health, property_factory, task_factory, user_factory, TestApp,
};

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/api/v1/health").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_detailed_health_endpoint() {
    let app = TestApp::new().await;
    mock_store_health(&app.store_mock).await;

    let response = app.get("/api/v1/health/detailed").await;
    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["components"]["database"]["status"], "healthy");
    assert_eq!(json["components"]["store"]["status"], "healthy");
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;
    app.get("/api/v1/health/live").await.assert_ok();
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;
    app.get("/api/v1/leads").await.assert_unauthorized();
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = TestApp::new().await;
    app.get_auth("/api/v1/leads", "not-a-token")
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_agent_lead_grants_lack_delete() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "agent", None);

    let response = app.get_auth("/api/v1/permissions", &token).await;
    response.assert_ok();

    let json: serde_json::Value = response.json();
    let leads_grant = json["grants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["resource"] == "leads")
        .expect("leads grant");
    let actions = leads_grant["actions"].as_array().unwrap();
    assert!(actions.iter().any(|a| a == "view"));
    assert!(!actions.iter().any(|a| a == "delete"));
    assert_eq!(leads_grant["scope"], "own");
}

#[tokio::test]
async fn test_admin_override_set_removes_team_module() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "admin", Some(vec!["dashboard", "leads"]));

    let response = app.get_auth("/api/v1/permissions", &token).await;
    response.assert_ok();

    let json: serde_json::Value = response.json();
    let modules = json["modules"].as_array().unwrap();
    assert!(modules.iter().any(|m| m == "leads"));
    assert!(!modules.iter().any(|m| m == "team"));
}

#[tokio::test]
async fn test_unknown_role_gets_no_modules() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "intern", None);

    let response = app.get_auth("/api/v1/permissions", &token).await;
    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert!(json["modules"].as_array().unwrap().is_empty());
    assert!(json["grants"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_agent_lead_listing_is_scoped_to_own() {
    let app = TestApp::new().await;
    let agent_id = Uuid::new_v4();
    let mut lead = lead_factory(app.tenant_id, PipelineStage::New);
    lead.assignee_id = Some(agent_id);

    // The store must only ever see the assignee-narrowed query
    Mock::given(method("GET"))
        .and(path("/v1/leads"))
        .and(query_param("assignee_id", agent_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json([&lead]))
        .expect(1)
        .mount(&app.store_mock)
        .await;

    let token = app.token(agent_id, "agent", None);
    let response = app.get_auth("/api/v1/leads", &token).await;

    response.assert_ok();
    let leads: Vec<serde_json::Value> = response.json();
    assert_eq!(leads.len(), 1);
}

#[tokio::test]
async fn test_create_lead_validation_error() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "manager", None);

    let response = app
        .post_json_auth(
            "/api/v1/leads",
            serde_json::json!({
                "name": "Ana Torres",
                "email": "not-an-email",
                "market": "national",
            }),
            &token,
        )
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_lead_budget_range_checked() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "manager", None);

    let response = app
        .post_json_auth(
            "/api/v1/leads",
            serde_json::json!({
                "name": "Ana Torres",
                "market": "national",
                "budget_min_cents": 40_000_000,
                "budget_max_cents": 25_000_000,
            }),
            &token,
        )
        .await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_csv_import_records_audit_trail() {
    let app = TestApp::new().await;
    let created = lead_factory(app.tenant_id, PipelineStage::New);
    Mock::given(method("POST"))
        .and(path("/v1/leads"))
        .respond_with(ResponseTemplate::new(201).set_body_json(&created))
        .expect(2)
        .mount(&app.store_mock)
        .await;

    let token = app.token(Uuid::new_v4(), "manager", None);
    let csv = "nombre,correo\nAna Torres,ana@example.com\nLuis Gómez,luis@example.com\n";
    let response = app.post_text_auth("/api/v1/leads/import", csv, &token).await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["imported"], 2);
    assert!(json["errors"].as_array().unwrap().is_empty());

    // The import shows up in the audit log
    let logs = app
        .get_auth("/api/v1/audit-logs?action=import", &token)
        .await;
    logs.assert_ok();
    let entries: Vec<serde_json::Value> = logs.json();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["resource_type"], "lead");
    assert_eq!(entries[0]["metadata"]["imported"], 2);
}

#[tokio::test]
async fn test_audit_logs_denied_below_manager() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "agent", None);
    app.get_auth("/api/v1/audit-logs", &token)
        .await
        .assert_forbidden();
}

#[tokio::test]
async fn test_agent_cannot_list_users() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "agent", None);
    app.get_auth("/api/v1/users", &token).await.assert_forbidden();
}

#[tokio::test]
async fn test_manager_cannot_create_admin() {
    let app = TestApp::new().await;
    let token = app.token(Uuid::new_v4(), "manager", None);

    let response = app
        .post_json_auth(
            "/api/v1/users",
            serde_json::json!({
                "name": "Marta Ruiz",
                "email": "marta@example.com",
                "role": "admin",
            }),
            &token,
        )
        .await;

    response.assert_forbidden();
}

#[tokio::test]
async fn test_manager_creates_agent() {
    let app = TestApp::new().await;
    let created = user_factory(app.tenant_id, "agent");
    Mock::given(method("POST"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(&created))
        .expect(1)
        .mount(&app.store_mock)
        .await;

    let token = app.token(Uuid::new_v4(), "manager", None);
    let response = app
        .post_json_auth(
            "/api/v1/users",
            serde_json::json!({
                "name": "Marta Ruiz",
                "email": "marta.ruiz@example.com",
                "role": "agent",
            }),
            &token,
        )
        .await;

    response.assert_created();
    let json: serde_json::Value = response.json();
    assert_eq!(json["role"], "agent");
}

#[tokio::test]
async fn test_agent_task_listing_is_scoped_to_own() {
    let app = TestApp::new().await;
    let agent_id = Uuid::new_v4();
    let mut task = task_factory(app.tenant_id);
    task.assignee_id = Some(agent_id);

    Mock::given(method("GET"))
        .and(path("/v1/tasks"))
        .and(query_param("assignee_id", agent_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json([&task]))
        .expect(1)
        .mount(&app.store_mock)
        .await;

    let token = app.token(agent_id, "agent", None);
    let response = app.get_auth("/api/v1/tasks", &token).await;

    response.assert_ok();
    let tasks: Vec<serde_json::Value> = response.json();
    assert_eq!(tasks.len(), 1);
}

#[tokio::test]
async fn test_backoffice_cannot_delete_properties() {
    let app = TestApp::new().await;
    let property = property_factory(app.tenant_id);

    let token = app.token(Uuid::new_v4(), "backoffice", None);
    let response = app
        .request(
            axum::http::Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/properties/{}", property.id))
                .header("Authorization", format!("Bearer {}", token))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    response.assert_forbidden();
}

#[tokio::test]
async fn test_lead_status_update_with_terminal_stage_archives() {
    let app = TestApp::new().await;
    let lead = lead_factory(app.tenant_id, PipelineStage::Negotiation);
    Mock::given(method("GET"))
        .and(path(format!("/v1/leads/{}", lead.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&lead))
        .mount(&app.store_mock)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/v1/leads/{}/status", lead.id)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.store_mock)
        .await;

    let token = app.token(Uuid::new_v4(), "manager", None);
    let response = app
        .put_json_auth(
            &format!("/api/v1/leads/{}/status", lead.id),
            serde_json::json!({ "stage": "closed-lost" }),
            &token,
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["stage"], "closed-lost");
}
