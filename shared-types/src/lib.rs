use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod auth;
pub mod filter;
pub mod lead;

pub use auth::{Credentials, UserProfile};
pub use filter::{FilterState, Pagination, DEFAULT_PAGE_SIZE};
pub use lead::{Lead, LeadPayload, LeadSource, LeadStatus, LeadsPage};

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}
