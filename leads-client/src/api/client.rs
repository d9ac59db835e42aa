use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shared_types::{Credentials, ErrorResponse, Lead, LeadPayload, LeadsPage, UserProfile};

use super::{ApiError, ApiResponse, AuthApi, LeadsApi};
use crate::config::ApiSettings;
use crate::query::LeadQuery;

/// JSON client for the leads backend. Keeps the session cookie in an
/// in-memory jar and sends it on every request.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| ApiError::BaseUrl(format!("{}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(settings.timeout())
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api{}", self.base_url, endpoint)
    }

    pub async fn request<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(endpoint);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("API request failed: {} {}: {}", method, url, e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::warn!("{} {} returned {}: {}", method, url, status.as_u16(), message);
            return Err(ApiError::status(status.as_u16(), message));
        }

        Ok(success_body(response).await)
    }

    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, endpoint, None::<&()>).await
    }

    pub async fn post<B>(&self, endpoint: &str, body: Option<&B>) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.request(Method::POST, endpoint, body).await
    }

    pub async fn put<B>(&self, endpoint: &str, body: Option<&B>) -> Result<ApiResponse, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.request(Method::PUT, endpoint, body).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::DELETE, endpoint, None::<&()>).await
    }

    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/users/profile")
            .await?
            .into_json::<OneOrWrapped<UserProfile>>()
            .map(OneOrWrapped::into_inner)
    }

    pub async fn update_profile(&self, profile: &UserProfile) -> Result<ApiResponse, ApiError> {
        self.put("/users/profile", Some(profile)).await
    }

    /// Changes the display name of the signed-in user. Returns the profile
    /// the backend sent back, or the one that was sent when it answered
    /// without a body.
    pub async fn rename(&self, name: &str) -> Result<UserProfile, ApiError> {
        let mut profile = self.profile().await?;
        profile.name = Some(name.to_string());

        match self.update_profile(&profile).await? {
            ApiResponse::Empty { .. } => Ok(profile),
            body => body
                .into_json::<OneOrWrapped<UserProfile>>()
                .map(OneOrWrapped::into_inner),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        match self.get("/users").await? {
            ApiResponse::Empty { .. } => Ok(Vec::new()),
            body => body.into_json::<UserList>().map(UserList::into_inner),
        }
    }
}

/// Message for a non-2xx response: the JSON body's `message`, the generic
/// status line when the JSON has none, or the reason phrase when the body
/// is not JSON at all.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let fallback = format!("HTTP error! status: {}", status.as_u16());
    let reason = || {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.clone())
    };

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(_) => return reason(),
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) => serde_json::from_value::<ErrorResponse>(value)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.clone()),
        Err(_) => reason(),
    }
}

async fn success_body(response: Response) -> ApiResponse {
    let status = response.status();
    let empty = ApiResponse::Empty {
        status: status.as_u16(),
    };

    if status == StatusCode::NO_CONTENT {
        return empty;
    }

    let headers = response.headers();
    let zero_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    if zero_length || !is_json {
        return empty;
    }

    match response.bytes().await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => ApiResponse::Json(value),
            Err(e) => {
                tracing::warn!("Failed to parse JSON response: {}", e);
                empty
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read response body: {}", e);
            empty
        }
    }
}

/// Accepts both a bare object and one wrapped in `{"data": ...}`. The
/// wrapped shape is tried first since a profile with all-optional fields
/// would otherwise match anything.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrWrapped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> OneOrWrapped<T> {
    fn into_inner(self) -> T {
        match self {
            OneOrWrapped::Wrapped { data: value } | OneOrWrapped::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserList {
    Bare(Vec<UserProfile>),
    Data { data: Vec<UserProfile> },
    Users { users: Vec<UserProfile> },
}

impl UserList {
    fn into_inner(self) -> Vec<UserProfile> {
        match self {
            UserList::Bare(users) | UserList::Data { data: users } | UserList::Users { users } => {
                users
            }
        }
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError> {
        self.post("/auth/login", Some(credentials)).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError> {
        self.post("/auth/register", Some(credentials)).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.post("/auth/logout", None::<&()>).await.map(|_| ())
    }

    async fn current_user(&self) -> Result<ApiResponse, ApiError> {
        self.get("/auth/me").await
    }
}

#[async_trait]
impl LeadsApi for ApiClient {
    async fn list_leads(&self, query: &LeadQuery) -> Result<LeadsPage, ApiError> {
        let endpoint = format!("/leads{}", query.to_query_string());
        match self.get(&endpoint).await? {
            ApiResponse::Empty { status } => {
                tracing::warn!("Lead listing returned an empty {} response", status);
                Ok(LeadsPage::default())
            }
            body => body.into_json(),
        }
    }

    async fn get_lead(&self, id: i64) -> Result<Lead, ApiError> {
        self.get(&format!("/leads/{}", id))
            .await?
            .into_json::<OneOrWrapped<Lead>>()
            .map(OneOrWrapped::into_inner)
    }

    async fn create_lead(&self, payload: &LeadPayload) -> Result<(), ApiError> {
        self.post("/leads", Some(payload)).await.map(|_| ())
    }

    async fn update_lead(&self, id: i64, payload: &LeadPayload) -> Result<(), ApiError> {
        self.put(&format!("/leads/{}", id), Some(payload))
            .await
            .map(|_| ())
    }

    async fn delete_lead(&self, id: i64) -> Result<(), ApiError> {
        let response = self.delete(&format!("/leads/{}", id)).await?;
        tracing::debug!("Delete response for lead {}: {:?}", id, response);
        Ok(())
    }
}
