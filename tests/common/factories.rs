//! Factories for test entities

use chrono::Utc;
use uuid::Uuid;

use inmo_crm::models::{Lead, Market, PipelineStage, Property, Task, User};

/// Build a lead with sensible defaults
pub fn lead_factory(tenant_id: Uuid, stage: PipelineStage) -> Lead {
    let now = Utc::now();
    Lead {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Ana Torres".to_string(),
        email: Some("ana.torres@example.com".to_string()),
        phone: Some("+34 612 345 678".to_string()),
        stage,
        market: Market::National,
        segment: Some("luxury".to_string()),
        assignee_id: None,
        budget_min_cents: Some(25_000_000),
        budget_max_cents: Some(40_000_000),
        currency: "EUR".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Build a user with the given role name
pub fn user_factory(tenant_id: Uuid, role: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Marta Ruiz".to_string(),
        email: "marta.ruiz@example.com".to_string(),
        role: role.to_string(),
        team_id: None,
        market: Some(Market::National),
        enabled_modules: None,
        auth_id: Some("auth0|abc123".to_string()),
        active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Build a task with defaults
pub fn task_factory(tenant_id: Uuid) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        tenant_id,
        title: "Call back about the viewing".to_string(),
        description: None,
        status: Default::default(),
        priority: Default::default(),
        due_date: None,
        lead_id: None,
        assignee_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Build a property listing with defaults
pub fn property_factory(tenant_id: Uuid) -> Property {
    let now = Utc::now();
    Property {
        id: Uuid::new_v4(),
        tenant_id,
        title: "3-bedroom flat, city centre".to_string(),
        address: "Calle Mayor 12, Madrid".to_string(),
        listing_type: inmo_crm::models::ListingType::Sale,
        price_cents: 42_000_000,
        currency: "EUR".to_string(),
        bedrooms: Some(3),
        bathrooms: Some(2),
        area_sqm: Some(95),
        status: Default::default(),
        market: Market::National,
        created_at: now,
        updated_at: now,
    }
}
