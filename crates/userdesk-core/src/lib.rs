//! # userdesk-core
//!
//! Client-side logic for the Userdesk administration console. The backend
//! REST API is the single source of truth; this crate owns everything the
//! shells share:
//! - Session lifecycle and persistence (`session` module)
//! - The backend API client with error classification (`client` module)
//! - Backend reachability monitoring (`monitor` module)
//! - The paginated/sortable listing state machine (`listing` module)
//! - CRUD orchestration with confirmation and notifications (`crud` module)
//! - Dashboard statistics (`dashboard` module)
//! - CSV export (`export` module)
//! - Wire models (`models` module) and error taxonomy (`error` module)

pub mod client;
pub mod crud;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod listing;
pub mod models;
pub mod monitor;
pub mod session;

// Re-exports for convenience
pub use client::{ApiClient, LoginOutcome};
pub use error::{Error, Result, GENERIC_ERROR_MESSAGE};
pub use export::{default_file_name, format_timestamp, render_csv, write_csv};
pub use session::SessionStore;

// Re-export commonly used types from models
pub use models::{
    ConnectionStatus, LoginRequest, LoginResponse, Page, PageRequest, PasswordResetRequest,
    Role, SessionUser, SortDir, User, UserDraft,
};

// Re-export commonly used types from the stateful components
pub use crud::{CrudOrchestrator, CrudOutcome, Notifier, PendingDelete, UserWriter};
pub use dashboard::{load_dashboard, DashboardStats, DashboardView, SystemStatus};
pub use listing::{FetchOutcome, ListController, ListSnapshot, UserDirectory};
pub use monitor::ConnectionMonitor;
