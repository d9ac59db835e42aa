use async_trait::async_trait;
use shared_types::{Credentials, Lead, LeadPayload, LeadStatus, LeadsPage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{ApiError, ApiResponse, AuthApi, LeadsApi};
use crate::query::LeadQuery;

/// Scripted in-memory backend. Queued results are consumed in order;
/// when a queue runs dry the call succeeds with a default value (the
/// session check defaults to a 401).
#[derive(Default)]
pub(crate) struct MockBackend {
    pages: Mutex<VecDeque<(Duration, Result<LeadsPage, ApiError>)>>,
    fallback_page: Mutex<LeadsPage>,
    deletes: Mutex<VecDeque<Result<(), ApiError>>>,
    saves: Mutex<VecDeque<Result<(), ApiError>>>,
    logins: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    registers: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    current_users: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    logout_error: Mutex<Option<ApiError>>,

    pub list_calls: Mutex<Vec<LeadQuery>>,
    pub delete_calls: Mutex<Vec<i64>>,
    pub save_calls: Mutex<Vec<(Option<i64>, LeadPayload)>>,
    pub login_calls: Mutex<Vec<Credentials>>,
    pub register_calls: Mutex<Vec<Credentials>>,
    pub current_user_calls: Mutex<Vec<tokio::time::Instant>>,
    pub logout_calls: Mutex<usize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: LeadsPage) {
        self.push_page_after(Duration::ZERO, Ok(page));
    }

    pub fn push_page_after(&self, delay: Duration, result: Result<LeadsPage, ApiError>) {
        self.pages.lock().unwrap().push_back((delay, result));
    }

    pub fn push_list_error(&self, error: ApiError) {
        self.push_page_after(Duration::ZERO, Err(error));
    }

    pub fn set_fallback_page(&self, page: LeadsPage) {
        *self.fallback_page.lock().unwrap() = page;
    }

    pub fn push_delete(&self, result: Result<(), ApiError>) {
        self.deletes.lock().unwrap().push_back(result);
    }

    pub fn push_save(&self, result: Result<(), ApiError>) {
        self.saves.lock().unwrap().push_back(result);
    }

    pub fn push_login(&self, result: Result<ApiResponse, ApiError>) {
        self.logins.lock().unwrap().push_back(result);
    }

    pub fn push_register(&self, result: Result<ApiResponse, ApiError>) {
        self.registers.lock().unwrap().push_back(result);
    }

    pub fn push_current_user(&self, result: Result<ApiResponse, ApiError>) {
        self.current_users.lock().unwrap().push_back(result);
    }

    pub fn fail_logout(&self, error: ApiError) {
        *self.logout_error.lock().unwrap() = Some(error);
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<LeadQuery> {
        self.list_calls.lock().unwrap().last().cloned()
    }

    pub fn current_user_count(&self) -> usize {
        self.current_user_calls.lock().unwrap().len()
    }
}

pub(crate) fn lead(id: i64) -> Lead {
    Lead {
        id,
        first_name: format!("First{}", id),
        last_name: format!("Last{}", id),
        email: format!("lead{}@example.com", id),
        phone: None,
        company: None,
        city: None,
        state: None,
        source: None,
        status: LeadStatus::New.to_string(),
        score: None,
        lead_value: None,
    }
}

pub(crate) fn page_of(ids: &[i64], total: u32, total_pages: u32) -> LeadsPage {
    LeadsPage {
        data: ids.iter().copied().map(lead).collect(),
        total,
        total_pages,
    }
}

pub(crate) fn server_error(message: &str) -> ApiError {
    ApiError::status(500, message)
}

pub(crate) fn ok_json() -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::Json(serde_json::json!({"id": 1, "email": "me@site.io"})))
}

pub(crate) fn unauthorized() -> Result<ApiResponse, ApiError> {
    Err(ApiError::status(401, "Not authenticated"))
}

#[async_trait]
impl LeadsApi for MockBackend {
    async fn list_leads(&self, query: &LeadQuery) -> Result<LeadsPage, ApiError> {
        self.list_calls.lock().unwrap().push(query.clone());
        let next = self.pages.lock().unwrap().pop_front();
        match next {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(self.fallback_page.lock().unwrap().clone()),
        }
    }

    async fn get_lead(&self, id: i64) -> Result<Lead, ApiError> {
        Ok(lead(id))
    }

    async fn create_lead(&self, payload: &LeadPayload) -> Result<(), ApiError> {
        self.save_calls.lock().unwrap().push((None, payload.clone()));
        self.saves.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn update_lead(&self, id: i64, payload: &LeadPayload) -> Result<(), ApiError> {
        self.save_calls.lock().unwrap().push((Some(id), payload.clone()));
        self.saves.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn delete_lead(&self, id: i64) -> Result<(), ApiError> {
        self.delete_calls.lock().unwrap().push(id);
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl AuthApi for MockBackend {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError> {
        self.login_calls.lock().unwrap().push(credentials.clone());
        self.logins.lock().unwrap().pop_front().unwrap_or_else(ok_json)
    }

    async fn register(&self, credentials: &Credentials) -> Result<ApiResponse, ApiError> {
        self.register_calls.lock().unwrap().push(credentials.clone());
        self.registers.lock().unwrap().pop_front().unwrap_or_else(ok_json)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        *self.logout_calls.lock().unwrap() += 1;
        match self.logout_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn current_user(&self) -> Result<ApiResponse, ApiError> {
        self.current_user_calls.lock().unwrap().push(tokio::time::Instant::now());
        self.current_users.lock().unwrap().pop_front().unwrap_or_else(unauthorized)
    }
}
