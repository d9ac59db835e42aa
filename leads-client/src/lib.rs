pub mod api;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod display;
pub mod forms;
pub mod query;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use session::{SessionGate, SessionState};
