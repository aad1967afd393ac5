//! Property listing model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{default_currency, Market};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Available,
    Reserved,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub address: String,
    pub listing_type: ListingType,
    pub price_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(default)]
    pub area_sqm: Option<u32>,
    #[serde(default)]
    pub status: PropertyStatus,
    pub market: Market,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    pub listing_type: ListingType,
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(default)]
    pub area_sqm: Option<u32>,
    pub market: Market,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 300))]
    #[serde(default)]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500))]
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub listing_type: Option<ListingType>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(default)]
    pub area_sqm: Option<u32>,
    #[serde(default)]
    pub market: Option<Market>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyQuery {
    pub listing_type: Option<ListingType>,
    pub status: Option<PropertyStatus>,
    pub market: Option<Market>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
