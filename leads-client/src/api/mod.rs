pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;

pub use client::ApiClient;
pub use error::ApiError;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use shared_types::{Credentials, Lead, LeadPayload, LeadsPage};

use crate::query::LeadQuery;

/// Normalized body of a successful response
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(serde_json::Value),
    /// 204, empty or non-JSON body
    Empty { status: u16 },
}

impl ApiResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, ApiResponse::Empty { .. })
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Json(value) => {
                serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
            }
            ApiResponse::Empty { status } => Err(ApiError::Decode(format!(
                "expected a JSON body, got an empty {} response",
                status
            ))),
        }
    }
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError>;
    async fn register(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    /// Session check; fails when the session cookie is missing or expired
    async fn current_user(&self) -> Result<ApiResponse, ApiError>;
}

#[async_trait]
pub trait LeadsApi: Send + Sync {
    async fn list_leads(&self, query: &LeadQuery) -> Result<LeadsPage, ApiError>;
    async fn get_lead(&self, id: i64) -> Result<Lead, ApiError>;
    async fn create_lead(&self, payload: &LeadPayload) -> Result<(), ApiError>;
    async fn update_lead(&self, id: i64, payload: &LeadPayload) -> Result<(), ApiError>;
    async fn delete_lead(&self, id: i64) -> Result<(), ApiError>;
}
