//! CRUD orchestrator
//!
//! Issues create/update/delete calls and, on success, re-fetches the list
//! controller's current page so pagination totals always reflect the
//! server's authoritative state. Local optimistic mutation is deliberately
//! avoided: an add or delete can shift which rows belong on the current
//! page, and only the backend knows the new arrangement.
//!
//! Notification rules: every outcome produces exactly one user-facing
//! notification, except connection failures, which only flip the
//! persistent connection indicator, and auth failures, which are
//! recovered globally (forced logout) rather than per call.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::listing::ListController;
use crate::models::{User, UserDraft};

/// Write access to the user directory. Implemented by the API client;
/// tests substitute recording fakes.
#[async_trait::async_trait]
pub trait UserWriter: Send + Sync {
    async fn create_user(&self, draft: &UserDraft) -> Result<User>;
    async fn update_user(&self, id: u64, draft: &UserDraft) -> Result<User>;
    async fn delete_user(&self, id: u64) -> Result<()>;
}

/// Sink for user-facing notifications (toasts in the browser build,
/// colored terminal lines in the CLI)
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// How a CRUD call ended, for callers that need to branch (e.g. exit codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudOutcome {
    /// The mutation succeeded and the listing was refreshed
    Completed,
    /// The backend was unreachable; the connection indicator was updated
    /// and no notification was raised
    ConnectionFailed,
    /// The backend rejected the mutation; an error notification was raised
    Rejected,
    /// There was no pending delete to confirm
    NothingPending,
}

/// A delete waiting for explicit confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub id: u64,
    pub name: String,
}

/// Orchestrates user mutations against a writer, keeping one list
/// controller in sync and raising one notification per outcome.
pub struct CrudOrchestrator {
    writer: Arc<dyn UserWriter>,
    listing: ListController,
    notifier: Arc<dyn Notifier>,
    pending_delete: Mutex<Option<PendingDelete>>,
}

impl CrudOrchestrator {
    pub fn new(
        writer: Arc<dyn UserWriter>,
        listing: ListController,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            writer,
            listing,
            notifier,
            pending_delete: Mutex::new(None),
        }
    }

    /// Create a user, refresh the current page, notify
    pub async fn create(&self, draft: &UserDraft) -> Result<CrudOutcome> {
        match self.writer.create_user(draft).await {
            Ok(user) => {
                self.listing.refresh().await;
                self.notifier
                    .success(&format!("User \"{}\" created successfully", user.name));
                Ok(CrudOutcome::Completed)
            }
            Err(err) => self.handle_failure(err, "Failed to add user"),
        }
    }

    /// Update a user, refresh the current page, notify
    pub async fn update(&self, id: u64, draft: &UserDraft) -> Result<CrudOutcome> {
        match self.writer.update_user(id, draft).await {
            Ok(user) => {
                self.listing.refresh().await;
                self.notifier
                    .success(&format!("User \"{}\" updated successfully", user.name));
                Ok(CrudOutcome::Completed)
            }
            Err(err) => self.handle_failure(err, "Failed to update user"),
        }
    }

    /// Stage a delete for the given id. The id must be visible on the
    /// current page; the display name is captured for the confirmation
    /// prompt. No server call happens here.
    pub fn request_delete(&self, id: u64) -> Option<PendingDelete> {
        let user = self.listing.find_item(id)?;
        let pending = PendingDelete {
            id,
            name: user.name,
        };
        *self.pending_delete.lock().unwrap() = Some(pending.clone());
        Some(pending)
    }

    /// Stage a delete with a known display name (for callers that resolved
    /// the target outside the current page)
    pub fn request_delete_named(&self, id: u64, name: impl Into<String>) -> PendingDelete {
        let pending = PendingDelete {
            id,
            name: name.into(),
        };
        *self.pending_delete.lock().unwrap() = Some(pending.clone());
        pending
    }

    /// The delete currently awaiting confirmation, if any
    pub fn pending_delete(&self) -> Option<PendingDelete> {
        self.pending_delete.lock().unwrap().clone()
    }

    /// Discard the pending delete without any server call. Safe to call
    /// when nothing is pending.
    pub fn cancel_delete(&self) {
        *self.pending_delete.lock().unwrap() = None;
    }

    /// Perform the staged delete: exactly one DELETE call, then one
    /// refresh of the current page, then one notification.
    pub async fn confirm_delete(&self) -> Result<CrudOutcome> {
        let pending = match self.pending_delete.lock().unwrap().take() {
            Some(pending) => pending,
            None => return Ok(CrudOutcome::NothingPending),
        };

        match self.writer.delete_user(pending.id).await {
            Ok(()) => {
                self.listing.refresh().await;
                self.notifier
                    .success(&format!("User \"{}\" removed successfully", pending.name));
                Ok(CrudOutcome::Completed)
            }
            Err(err) => self.handle_failure(err, "Failed to delete user"),
        }
    }

    fn handle_failure(&self, err: Error, message: &str) -> Result<CrudOutcome> {
        match err {
            Error::Connection => {
                // Connection failures surface through the indicator only
                self.listing.note_connection_failure();
                Ok(CrudOutcome::ConnectionFailed)
            }
            Error::Auth => Err(err),
            Error::Validation(detail) => {
                self.notifier.error(&format!("{}: {}", message, detail));
                Ok(CrudOutcome::Rejected)
            }
            _ => {
                log::error!("{}: {}", message, err);
                self.notifier.error(message);
                Ok(CrudOutcome::Rejected)
            }
        }
    }
}
