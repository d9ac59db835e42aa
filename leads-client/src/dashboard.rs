//! Lead list and pagination state, kept in step with the backend.
//!
//! [`Dashboard`] is the only writer of the listing state. Callers change it
//! through the async operations below and read it back as an immutable
//! [`DashboardSnapshot`]. Every fetch is numbered when issued and its
//! response is applied only if no newer fetch has been issued since, so a
//! slow page can never overwrite a newer one. A delete that lands while a
//! fetch is in flight issues a fresh fetch for the current filters, since
//! the pending page may have been read before the row went away.

use shared_types::{FilterState, Lead, Pagination};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::{ApiError, LeadsApi};
use crate::config::DashboardSettings;
use crate::forms::{LeadForm, ValidationErrors};
use crate::query::build_query;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this lead?";
pub const DELETE_SUCCESS: &str = "Lead deleted successfully";

/// Blocking yes/no question asked before destructive actions
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LeadEditor {
    #[default]
    Closed,
    Creating {
        error: Option<String>,
    },
    Editing {
        lead: Lead,
        error: Option<String>,
    },
}

impl LeadEditor {
    pub fn is_open(&self) -> bool {
        !matches!(self, LeadEditor::Closed)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LeadEditor::Closed => None,
            LeadEditor::Creating { error } | LeadEditor::Editing { error, .. } => error.as_deref(),
        }
    }

    fn set_error(&mut self, message: String) {
        match self {
            LeadEditor::Closed => {}
            LeadEditor::Creating { error } | LeadEditor::Editing { error, .. } => {
                *error = Some(message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub leads: Vec<Lead>,
    pub pagination: Pagination,
    pub filters: FilterState,
    pub loading: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
    pub editor: LeadEditor,
}

impl DashboardSnapshot {
    /// Full-screen spinner only while nothing is listed yet, so refetches
    /// keep the current rows on screen
    pub fn show_loading_screen(&self) -> bool {
        self.loading && self.leads.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was issued while this one was in flight
    Stale,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted,
    Failed,
}

/// Why a create or update did not go through
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),
    #[error("{0}")]
    Rejected(#[from] ApiError),
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    expires_at: Instant,
}

impl Notice {
    fn active_text(&self) -> Option<String> {
        (Instant::now() < self.expires_at).then(|| self.text.clone())
    }
}

#[derive(Debug)]
struct DashboardState {
    leads: Vec<Lead>,
    pagination: Pagination,
    filters: FilterState,
    loading: bool,
    error: Option<String>,
    success: Option<Notice>,
    editor: LeadEditor,
    latest_fetch: u64,
    /// The latest fetch has not answered yet
    in_flight: bool,
}

/// Pagination after one row disappeared locally
pub fn after_removal(pagination: Pagination) -> Pagination {
    let total = pagination.total.saturating_sub(1);
    let total_pages = total.div_ceil(pagination.limit.max(1));
    let page = if pagination.page > total_pages {
        total_pages.max(1)
    } else {
        pagination.page
    };

    Pagination {
        page,
        total,
        total_pages,
        ..pagination
    }
}

pub struct Dashboard {
    api: Arc<dyn LeadsApi>,
    success_ttl: Duration,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn LeadsApi>, settings: &DashboardSettings) -> Self {
        Self {
            api,
            success_ttl: settings.success_message_ttl(),
            state: Mutex::new(DashboardState {
                leads: Vec::new(),
                pagination: Pagination::with_limit(settings.page_size),
                filters: FilterState::default(),
                loading: true,
                error: None,
                success: None,
                editor: LeadEditor::Closed,
                latest_fetch: 0,
                in_flight: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state();
        DashboardSnapshot {
            leads: state.leads.clone(),
            pagination: state.pagination,
            filters: state.filters.clone(),
            loading: state.loading,
            error: state.error.clone(),
            success_message: state.success.as_ref().and_then(Notice::active_text),
            editor: state.editor.clone(),
        }
    }

    pub async fn fetch(&self) -> FetchOutcome {
        let (seq, query) = {
            let mut state = self.state();
            state.latest_fetch += 1;
            state.loading = true;
            state.in_flight = true;
            let query = build_query(
                &state.filters,
                state.pagination.page,
                state.pagination.limit,
            );
            (state.latest_fetch, query)
        };

        let result = self.api.list_leads(&query).await;

        let mut state = self.state();
        if seq != state.latest_fetch {
            tracing::debug!(
                "Discarding lead page #{} (latest is #{})",
                seq,
                state.latest_fetch
            );
            return FetchOutcome::Stale;
        }

        state.loading = false;
        state.in_flight = false;
        match result {
            Ok(page) => {
                tracing::debug!(
                    "Fetched {} leads (total {}, {} pages)",
                    page.data.len(),
                    page.total,
                    page.total_pages
                );
                state.leads = page.data;
                state.pagination.total = page.total;
                state.pagination.total_pages = page.total_pages;
                FetchOutcome::Applied
            }
            Err(e) => {
                tracing::error!("Failed to fetch leads: {}", e);
                state.error = Some(e.to_string());
                FetchOutcome::Failed
            }
        }
    }

    /// Replaces the filters and goes back to the first page
    pub async fn change_filter(&self, filters: FilterState) -> FetchOutcome {
        {
            let mut state = self.state();
            state.filters = filters;
            state.pagination.page = 1;
        }
        self.fetch().await
    }

    /// Jumps to `page` as given; bounds are only enforced after deletes
    pub async fn change_page(&self, page: u32) -> FetchOutcome {
        self.state().pagination.page = page;
        self.fetch().await
    }

    pub async fn change_limit(&self, limit: u32) -> FetchOutcome {
        {
            let mut state = self.state();
            state.pagination.limit = limit.max(1);
            state.pagination.page = 1;
        }
        self.fetch().await
    }

    pub fn open_create(&self) {
        self.state().editor = LeadEditor::Creating { error: None };
    }

    /// Opens the edit form for a listed lead
    pub fn open_edit(&self, id: i64) -> Option<Lead> {
        let mut state = self.state();
        let lead = state.leads.iter().find(|lead| lead.id == id).cloned()?;
        state.editor = LeadEditor::Editing {
            lead: lead.clone(),
            error: None,
        };
        Some(lead)
    }

    pub fn close_editor(&self) {
        self.state().editor = LeadEditor::Closed;
    }

    pub fn dismiss_error(&self) {
        self.state().error = None;
    }

    pub async fn create(&self, form: &LeadForm) -> Result<(), SubmitError> {
        let payload = form.validate().map_err(|errors| self.reject_form(errors))?;

        if let Err(e) = self.api.create_lead(&payload).await {
            tracing::error!("Failed to create lead: {}", e);
            return Err(self.reject_form(e));
        }

        tracing::info!("Created lead {}", payload.email);
        self.close_editor();
        self.fetch().await;
        Ok(())
    }

    pub async fn update(&self, id: i64, form: &LeadForm) -> Result<(), SubmitError> {
        let payload = form.validate().map_err(|errors| self.reject_form(errors))?;

        if let Err(e) = self.api.update_lead(id, &payload).await {
            tracing::error!("Failed to update lead {}: {}", id, e);
            return Err(self.reject_form(e));
        }

        tracing::info!("Updated lead {}", id);
        self.close_editor();
        self.fetch().await;
        Ok(())
    }

    fn reject_form(&self, error: impl Into<SubmitError>) -> SubmitError {
        let error = error.into();
        self.state().editor.set_error(error.to_string());
        error
    }

    /// Deletes after confirmation. Success patches the list in place and
    /// only goes back to the server when a fetch was pending; a failure
    /// reloads the page.
    pub async fn delete<C>(&self, id: i64, confirm: &C) -> DeleteOutcome
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(DELETE_PROMPT) {
            tracing::debug!("Delete of lead {} cancelled", id);
            return DeleteOutcome::Cancelled;
        }

        {
            let mut state = self.state();
            state.error = None;
            state.success = None;
        }

        tracing::info!("Deleting lead {}", id);
        match self.api.delete_lead(id).await {
            Ok(()) => {
                let refetch = {
                    let mut state = self.state();
                    state.leads.retain(|lead| lead.id != id);
                    state.pagination = after_removal(state.pagination);
                    state.success = Some(Notice {
                        text: DELETE_SUCCESS.to_string(),
                        expires_at: Instant::now() + self.success_ttl,
                    });
                    tracing::debug!(
                        "{} leads remaining, pagination now {:?}",
                        state.leads.len(),
                        state.pagination
                    );
                    state.in_flight
                };
                if refetch {
                    tracing::debug!("Fetch pending during delete of lead {}, reloading", id);
                    self.fetch().await;
                }
                DeleteOutcome::Deleted
            }
            Err(e) => {
                tracing::error!("Failed to delete lead {}: {}", id, e);
                self.state().error = Some(format!("Failed to delete lead: {}", e));
                self.fetch().await;
                DeleteOutcome::Failed
            }
        }
    }
}
