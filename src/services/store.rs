//! Hosted data-store client
//!
//! All tenant data (leads, properties, tasks, users) lives in a hosted
//! relational database service reached over HTTPS. This module is the only
//! place its wire JSON is parsed: every response is deserialized into the
//! typed records in `crate::models` before anything else touches it.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::models::{
    CreateLeadRequest, CreatePropertyRequest, CreateTaskRequest, CreateUserRequest, Lead,
    LeadQuery, PipelineStage, Property, PropertyQuery, Task, TaskQuery, UpdateLeadRequest,
    UpdatePropertyRequest, UpdateTaskRequest, UpdateUserRequest, User, UserQuery,
};
use crate::services::pipeline::LeadStore;

/// Client for the hosted data store
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("inmo-crm/", env!("CARGO_PKG_VERSION")));

        if let Some(ref key) = config.service_key {
            let mut headers = reqwest::header::HeaderMap::new();
            let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key))
                .context("Invalid store service key")?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        let client = builder.build().context("Failed to build store HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.context("Store request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Store returned {}: {}", status, body);
        }
        response
            .json::<T>()
            .await
            .context("Failed to decode store response")
    }

    async fn send_no_content(&self, request: RequestBuilder) -> Result<()> {
        let response = request.send().await.context("Store request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Store returned {}: {}", status, body);
        }
        Ok(())
    }

    fn tenant_query<'a, Q: Serialize>(
        &self,
        request: RequestBuilder,
        tenant_id: Uuid,
        query: &'a Q,
    ) -> RequestBuilder {
        request
            .query(&[("tenant_id", tenant_id.to_string())])
            .query(query)
    }

    // Leads

    pub async fn list_leads(&self, tenant_id: Uuid, query: &LeadQuery) -> Result<Vec<Lead>> {
        let request = self.client.get(self.url("/leads"));
        self.send_json(self.tenant_query(request, tenant_id, &LeadQueryParams::from(query)))
            .await
    }

    pub async fn get_lead(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Lead>> {
        let request = self
            .client
            .get(self.url(&format!("/leads/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())]);
        let response = request.send().await.context("Store request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Store returned {}", status);
        }
        let lead = response
            .json::<Lead>()
            .await
            .context("Failed to decode lead row")?;
        Ok(Some(lead))
    }

    pub async fn create_lead(&self, tenant_id: Uuid, req: &CreateLeadRequest) -> Result<Lead> {
        let request = self
            .client
            .post(self.url("/leads"))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn update_lead(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: &UpdateLeadRequest,
    ) -> Result<Lead> {
        let request = self
            .client
            .patch(self.url(&format!("/leads/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    /// Persist a stage change. Idempotent from the caller's point of view:
    /// the store may answer 409 when the lead already sits in the requested
    /// stage, which is treated as success here.
    pub async fn update_lead_status(&self, lead_id: Uuid, stage: PipelineStage) -> Result<()> {
        let request = self
            .client
            .put(self.url(&format!("/leads/{}/status", lead_id)))
            .json(&serde_json::json!({ "stage": stage }));

        let response = request.send().await.context("Store request failed")?;
        let status = response.status();
        if status == StatusCode::CONFLICT {
            debug!(%lead_id, stage = %stage, "store reports stage already set");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Store returned {}: {}", status, body);
        }
        Ok(())
    }

    // Users

    pub async fn list_users(&self, tenant_id: Uuid, query: &UserQuery) -> Result<Vec<User>> {
        let request = self.client.get(self.url("/users"));
        self.send_json(self.tenant_query(request, tenant_id, &UserQueryParams::from(query)))
            .await
    }

    pub async fn get_user(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<User>> {
        let request = self
            .client
            .get(self.url(&format!("/users/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())]);
        let response = request.send().await.context("Store request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Store returned {}", status);
        }
        let user = response
            .json::<User>()
            .await
            .context("Failed to decode user row")?;
        Ok(Some(user))
    }

    pub async fn create_user(&self, tenant_id: Uuid, req: &CreateUserRequest) -> Result<User> {
        let request = self
            .client
            .post(self.url("/users"))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn update_user(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: &UpdateUserRequest,
    ) -> Result<User> {
        let request = self
            .client
            .patch(self.url(&format!("/users/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn deactivate_user(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("/users/{}/deactivate", id)))
            .query(&[("tenant_id", tenant_id.to_string())]);
        self.send_no_content(request).await
    }

    // Tasks

    pub async fn list_tasks(&self, tenant_id: Uuid, query: &TaskQuery) -> Result<Vec<Task>> {
        let request = self.client.get(self.url("/tasks"));
        self.send_json(self.tenant_query(request, tenant_id, &TaskQueryParams::from(query)))
            .await
    }

    pub async fn create_task(&self, tenant_id: Uuid, req: &CreateTaskRequest) -> Result<Task> {
        let request = self
            .client
            .post(self.url("/tasks"))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn update_task(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Task> {
        let request = self
            .client
            .patch(self.url(&format!("/tasks/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn delete_task(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("/tasks/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())]);
        self.send_no_content(request).await
    }

    // Properties

    pub async fn list_properties(
        &self,
        tenant_id: Uuid,
        query: &PropertyQuery,
    ) -> Result<Vec<Property>> {
        let request = self.client.get(self.url("/properties"));
        self.send_json(self.tenant_query(request, tenant_id, &PropertyQueryParams::from(query)))
            .await
    }

    pub async fn create_property(
        &self,
        tenant_id: Uuid,
        req: &CreatePropertyRequest,
    ) -> Result<Property> {
        let request = self
            .client
            .post(self.url("/properties"))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn get_property(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Property>> {
        let request = self
            .client
            .get(self.url(&format!("/properties/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())]);
        let response = request.send().await.context("Store request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Store returned {}", status);
        }
        let property = response
            .json::<Property>()
            .await
            .context("Failed to decode property row")?;
        Ok(Some(property))
    }

    pub async fn update_property(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        req: &UpdatePropertyRequest,
    ) -> Result<Property> {
        let request = self
            .client
            .patch(self.url(&format!("/properties/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())])
            .json(req);
        self.send_json(request).await
    }

    pub async fn delete_property(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("/properties/{}", id)))
            .query(&[("tenant_id", tenant_id.to_string())]);
        self.send_no_content(request).await
    }

    /// Connectivity probe for health checks
    pub async fn ping(&self) -> Result<()> {
        let request = self.client.get(self.url("/health"));
        match self.send_no_content(request).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "store health probe failed");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl LeadStore for StoreClient {
    async fn update_status(&self, lead_id: Uuid, stage: PipelineStage) -> Result<()> {
        self.update_lead_status(lead_id, stage).await
    }
}

// Serializable query-string shapes. Kept separate from the model query
// structs so enum values serialize as their wire strings.

#[derive(Serialize)]
struct LeadQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl From<&LeadQuery> for LeadQueryParams {
    fn from(q: &LeadQuery) -> Self {
        Self {
            stage: q.stage.map(|s| s.as_str().to_string()),
            market: q.market.map(|m| m.as_str().to_string()),
            segment: q.segment.clone(),
            assignee_id: q.assignee_id,
            team_id: q.team_id,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

#[derive(Serialize)]
struct UserQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl From<&UserQuery> for UserQueryParams {
    fn from(q: &UserQuery) -> Self {
        Self {
            role: q.role.map(|r| r.as_str().to_string()),
            team_id: q.team_id,
            market: q.market.map(|m| m.as_str().to_string()),
            active: q.active,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

#[derive(Serialize)]
struct TaskQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<crate::models::TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl From<&TaskQuery> for TaskQueryParams {
    fn from(q: &TaskQuery) -> Self {
        Self {
            status: q.status,
            assignee_id: q.assignee_id,
            team_id: q.team_id,
            lead_id: q.lead_id,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

#[derive(Serialize)]
struct PropertyQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    listing_type: Option<crate::models::ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<crate::models::PropertyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u32>,
}

impl From<&PropertyQuery> for PropertyQueryParams {
    fn from(q: &PropertyQuery) -> Self {
        Self {
            listing_type: q.listing_type,
            status: q.status,
            market: q.market.map(|m| m.as_str().to_string()),
            limit: q.limit,
            offset: q.offset,
        }
    }
}
