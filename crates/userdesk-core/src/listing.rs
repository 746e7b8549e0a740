//! Paginated list controller
//!
//! The shared state machine behind every listing view (user directory and
//! reports): current page, sort column and direction, totals, loading and
//! error state, and backend reachability. One controller instance is the
//! single source of truth for one view.
//!
//! Two guards keep network traffic and view state honest:
//! - a reentrancy guard: `fetch` is a no-op while another fetch is in
//!   flight, so rapid repeated triggers cost at most one request
//! - a sequence ticket: every fetch is tagged, and a response whose ticket
//!   has been superseded is discarded instead of overwriting newer state

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::models::{ConnectionStatus, Page, PageRequest, Role, SortDir, User};

/// Read access to one page of the user directory. Implemented by the API
/// client; tests substitute scripted fakes.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_page(&self, role: Option<Role>, req: &PageRequest) -> Result<Page>;
}

/// What a fetch attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh state was applied
    Applied,
    /// Another fetch was already in flight; no request was made
    SkippedInFlight,
    /// The initial fetch already completed; no request was made
    AlreadyFetched,
    /// The requested page is outside [1, total_pages]; no request was made
    OutOfRange,
    /// The response arrived after a newer fetch superseded it; dropped
    DiscardedStale,
    /// The backend rejected the credentials; the session has been cleared
    Unauthorized,
    /// The fetch failed; connection status and error text were updated
    Failed,
}

/// One-shot startup latch. Tri-state rather than a boolean so a failed
/// initial fetch can still be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPhase {
    NotStarted,
    InFlight,
    Done,
}

#[derive(Debug)]
struct ListState {
    items: Vec<User>,
    current_page: u32,
    total_pages: u32,
    total_users: u64,
    sort_by: Option<String>,
    sort_dir: SortDir,
    loading: bool,
    error: Option<String>,
    connection: ConnectionStatus,
    phase: FetchPhase,
    seq: u64,
}

impl ListState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_users: 0,
            sort_by: None,
            sort_dir: SortDir::Asc,
            loading: false,
            error: None,
            connection: ConnectionStatus::Failed,
            phase: FetchPhase::NotStarted,
            seq: 0,
        }
    }
}

/// Point-in-time copy of the view state, for rendering
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub items: Vec<User>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_users: u64,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_dir: SortDir,
    pub loading: bool,
    pub error: Option<String>,
    pub connection: ConnectionStatus,
}

/// Pagination/sorting state machine over a `UserDirectory`.
///
/// Cheap to clone; clones share state, which is how a long-lived view and
/// its event handlers observe the same page.
#[derive(Clone)]
pub struct ListController {
    directory: Arc<dyn UserDirectory>,
    role_filter: Option<Role>,
    page_size: u32,
    state: Arc<Mutex<ListState>>,
}

impl ListController {
    pub fn new(directory: Arc<dyn UserDirectory>, role_filter: Option<Role>, page_size: u32) -> Self {
        Self {
            directory,
            role_filter,
            page_size,
            state: Arc::new(Mutex::new(ListState::new())),
        }
    }

    /// Fetch the given page with the current sort settings. No-op while a
    /// fetch is already in flight.
    pub async fn fetch(&self, page: u32) -> FetchOutcome {
        self.fetch_inner(page, false).await
    }

    /// Run the initial fetch exactly once, even when the startup path is
    /// invoked twice. A failed initial fetch resets the latch so a retry
    /// is still possible.
    pub async fn ensure_initial_fetch(&self) -> FetchOutcome {
        {
            let state = self.state.lock().unwrap();
            match state.phase {
                FetchPhase::NotStarted => {}
                FetchPhase::InFlight => return FetchOutcome::SkippedInFlight,
                FetchPhase::Done => return FetchOutcome::AlreadyFetched,
            }
        }
        self.fetch(1).await
    }

    /// Navigate to a page. Out-of-range requests are rejected without a
    /// network call.
    pub async fn change_page(&self, page: u32) -> FetchOutcome {
        let total_pages = self.state.lock().unwrap().total_pages;
        if page < 1 || page > total_pages {
            log::debug!("ignoring out-of-range page request: {}", page);
            return FetchOutcome::OutOfRange;
        }
        self.fetch(page).await
    }

    /// Select a sort column. Re-selecting the current column toggles the
    /// direction; a new column starts ascending. Always returns to page 1.
    ///
    /// A sort change expresses fresh user intent, so it supersedes any
    /// fetch still in flight; the superseded response will be discarded.
    pub async fn change_sort(&self, column: &str) -> FetchOutcome {
        {
            let mut state = self.state.lock().unwrap();
            if state.sort_by.as_deref() == Some(column) {
                state.sort_dir = state.sort_dir.toggled();
            } else {
                state.sort_by = Some(column.to_string());
                state.sort_dir = SortDir::Asc;
            }
        }
        self.fetch_inner(1, true).await
    }

    /// Set an explicit sort column and direction, then fetch page 1.
    /// Supersedes any in-flight fetch, like `change_sort`.
    pub async fn set_sort(&self, column: &str, dir: SortDir) -> FetchOutcome {
        {
            let mut state = self.state.lock().unwrap();
            state.sort_by = Some(column.to_string());
            state.sort_dir = dir;
        }
        self.fetch_inner(1, true).await
    }

    /// Re-fetch the current page (used after CRUD mutations and for the
    /// manual retry action)
    pub async fn refresh(&self) -> FetchOutcome {
        let page = self.state.lock().unwrap().current_page;
        self.fetch(page).await
    }

    /// Record that the backend is unreachable without touching items.
    /// Used by callers whose own request failed with a connection error.
    pub fn note_connection_failure(&self) {
        self.state.lock().unwrap().connection = ConnectionStatus::Failed;
    }

    /// Current view state
    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock().unwrap();
        ListSnapshot {
            items: state.items.clone(),
            current_page: state.current_page,
            total_pages: state.total_pages,
            total_users: state.total_users,
            page_size: self.page_size,
            sort_by: state.sort_by.clone(),
            sort_dir: state.sort_dir,
            loading: state.loading,
            error: state.error.clone(),
            connection: state.connection,
        }
    }

    /// Find a listed user by id on the current page
    pub fn find_item(&self, id: u64) -> Option<User> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .find(|u| u.id == Some(id))
            .cloned()
    }

    async fn fetch_inner(&self, page: u32, supersede: bool) -> FetchOutcome {
        let (ticket, request) = {
            let mut state = self.state.lock().unwrap();
            if state.loading && !supersede {
                return FetchOutcome::SkippedInFlight;
            }
            state.loading = true;
            state.error = None;
            if state.phase == FetchPhase::NotStarted {
                state.phase = FetchPhase::InFlight;
            }
            state.seq += 1;
            let request = PageRequest {
                page,
                size: self.page_size,
                sort_by: state.sort_by.clone(),
                sort_dir: state.sort_dir,
            };
            (state.seq, request)
        };

        let result = self.directory.fetch_page(self.role_filter, &request).await;

        let mut state = self.state.lock().unwrap();
        if state.seq != ticket {
            // A newer fetch owns the view now; this response is stale.
            return FetchOutcome::DiscardedStale;
        }
        state.loading = false;

        match result {
            Ok(page) => {
                state.items = page.users;
                state.current_page = page.current_page;
                state.total_pages = page.total_pages;
                state.total_users = page.total_users;
                state.connection = ConnectionStatus::Connected;
                state.error = None;
                state.phase = FetchPhase::Done;
                FetchOutcome::Applied
            }
            Err(Error::Auth) => {
                // Globally recovered: the session is already cleared and the
                // caller sends the user back to login. No per-view error.
                if state.phase == FetchPhase::InFlight {
                    state.phase = FetchPhase::NotStarted;
                }
                FetchOutcome::Unauthorized
            }
            Err(err) => {
                state.connection = ConnectionStatus::Failed;
                if !err.is_connection() {
                    // The connection banner takes precedence over error text,
                    // so connection failures leave `error` unset.
                    state.error = Some(err.to_string());
                }
                if state.phase == FetchPhase::InFlight {
                    state.phase = FetchPhase::NotStarted;
                }
                FetchOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    // ========================================================================
    // Scripted Directory Fake
    // ========================================================================

    /// Coordinates a response that must wait until the test releases it
    struct Gate {
        started: Notify,
        release: Notify,
    }

    struct Planned {
        result: Result<Page>,
        gate: Option<Arc<Gate>>,
    }

    struct ScriptedDirectory {
        responses: Mutex<VecDeque<Planned>>,
        requests: Mutex<Vec<PageRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedDirectory {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn push(&self, result: Result<Page>) {
            self.responses.lock().unwrap().push_back(Planned { result, gate: None });
        }

        fn push_gated(&self, result: Result<Page>) -> Arc<Gate> {
            let gate = Arc::new(Gate {
                started: Notify::new(),
                release: Notify::new(),
            });
            self.responses.lock().unwrap().push_back(Planned {
                result,
                gate: Some(gate.clone()),
            });
            gate
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn recorded_requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl UserDirectory for ScriptedDirectory {
        async fn fetch_page(&self, _role: Option<Role>, req: &PageRequest) -> Result<Page> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(req.clone());
            let planned = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted directory ran out of responses");
            if let Some(gate) = &planned.gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            planned.result
        }
    }

    fn user(id: u64, name: &str) -> User {
        User {
            id: Some(id),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            username: name.to_lowercase(),
            password: None,
            role: Some(Role::User),
            created_at: Some("2026-01-15T10:00:00".to_string()),
            updated_at: None,
        }
    }

    fn page(current: u32, total_pages: u32, total_users: u64, names: &[&str]) -> Page {
        Page {
            users: names
                .iter()
                .enumerate()
                .map(|(i, n)| user(current as u64 * 100 + i as u64, n))
                .collect(),
            current_page: current,
            total_pages,
            total_users,
            page_size: 5,
        }
    }

    fn controller(directory: Arc<ScriptedDirectory>) -> ListController {
        ListController::new(directory, None, 5)
    }

    // ========================================================================
    // State Application Tests
    // ========================================================================

    #[tokio::test]
    async fn test_fetch_applies_page_state() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 3, 12, &["Ada", "Bo", "Cy", "Dee", "Ed"])));
        let ctl = controller(dir.clone());

        let outcome = ctl.fetch(1).await;

        assert_eq!(outcome, FetchOutcome::Applied);
        let snap = ctl.snapshot();
        assert_eq!(snap.items.len(), 5);
        assert_eq!(snap.current_page, 1);
        assert_eq!(snap.total_pages, 3);
        assert_eq!(snap.total_users, 12);
        assert_eq!(snap.connection, ConnectionStatus::Connected);
        assert!(!snap.loading);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_items_never_exceed_page_size_contract() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(2, 3, 12, &["Fi", "Gus"])));
        let ctl = controller(dir.clone());

        ctl.fetch(2).await;

        let snap = ctl.snapshot();
        assert!(snap.items.len() as u32 <= snap.page_size);
        assert_eq!(snap.current_page, 2);
    }

    #[tokio::test]
    async fn test_empty_result_is_valid_state_not_error() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 1, 0, &[])));
        let ctl = controller(dir.clone());

        let outcome = ctl.fetch(1).await;

        assert_eq!(outcome, FetchOutcome::Applied);
        let snap = ctl.snapshot();
        assert!(snap.items.is_empty());
        assert_eq!(snap.total_users, 0);
        assert!(snap.error.is_none());
        assert_eq!(snap.connection, ConnectionStatus::Connected);
    }

    // ========================================================================
    // Page Bounds Tests
    // ========================================================================

    #[tokio::test]
    async fn test_change_page_rejects_out_of_range() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 3, 12, &["Ada"])));
        let ctl = controller(dir.clone());
        ctl.fetch(1).await;
        let before = ctl.snapshot();

        assert_eq!(ctl.change_page(0).await, FetchOutcome::OutOfRange);
        assert_eq!(ctl.change_page(4).await, FetchOutcome::OutOfRange);

        // State untouched, no extra network calls
        let after = ctl.snapshot();
        assert_eq!(after.current_page, before.current_page);
        assert_eq!(after.items, before.items);
        assert_eq!(dir.call_count(), 1);
    }

    #[tokio::test]
    async fn test_change_page_within_range_fetches() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 3, 12, &["Ada"])));
        dir.push(Ok(page(2, 3, 12, &["Bo"])));
        let ctl = controller(dir.clone());
        ctl.fetch(1).await;

        let outcome = ctl.change_page(2).await;

        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(ctl.snapshot().current_page, 2);
        assert_eq!(dir.call_count(), 2);
    }

    // ========================================================================
    // Reentrancy Guard Tests
    // ========================================================================

    #[tokio::test]
    async fn test_fetch_while_in_flight_is_noop() {
        let dir = ScriptedDirectory::new();
        let gate = dir.push_gated(Ok(page(1, 1, 1, &["Ada"])));
        let ctl = controller(dir.clone());

        let bg = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.fetch(1).await })
        };
        gate.started.notified().await;

        // Second trigger while the first is still in flight
        assert_eq!(ctl.fetch(2).await, FetchOutcome::SkippedInFlight);
        assert!(ctl.snapshot().loading);

        gate.release.notify_one();
        assert_eq!(bg.await.unwrap(), FetchOutcome::Applied);
        assert_eq!(dir.call_count(), 1);
    }

    #[tokio::test]
    async fn test_initial_fetch_latch_runs_once() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 1, 1, &["Ada"])));
        let ctl = controller(dir.clone());

        assert_eq!(ctl.ensure_initial_fetch().await, FetchOutcome::Applied);
        assert_eq!(ctl.ensure_initial_fetch().await, FetchOutcome::AlreadyFetched);
        assert_eq!(dir.call_count(), 1);
    }

    #[tokio::test]
    async fn test_initial_fetch_latch_allows_retry_after_failure() {
        let dir = ScriptedDirectory::new();
        dir.push(Err(Error::Connection));
        dir.push(Ok(page(1, 1, 1, &["Ada"])));
        let ctl = controller(dir.clone());

        assert_eq!(ctl.ensure_initial_fetch().await, FetchOutcome::Failed);
        // The latch is not permanently closed by a failure
        assert_eq!(ctl.ensure_initial_fetch().await, FetchOutcome::Applied);
        assert_eq!(dir.call_count(), 2);
    }

    // ========================================================================
    // Sort Tests
    // ========================================================================

    #[tokio::test]
    async fn test_sort_toggles_on_same_column() {
        let dir = ScriptedDirectory::new();
        for _ in 0..3 {
            dir.push(Ok(page(1, 1, 2, &["Ada", "Bo"])));
        }
        let ctl = controller(dir.clone());

        ctl.change_sort("name").await;
        assert_eq!(ctl.snapshot().sort_dir, SortDir::Asc);

        ctl.change_sort("name").await;
        assert_eq!(ctl.snapshot().sort_dir, SortDir::Desc);

        // Toggling twice returns to the original direction
        ctl.change_sort("name").await;
        assert_eq!(ctl.snapshot().sort_dir, SortDir::Asc);
    }

    #[tokio::test]
    async fn test_sort_new_column_resets_to_ascending_and_page_one() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 3, 12, &["Ada"])));
        dir.push(Ok(page(2, 3, 12, &["Bo"])));
        dir.push(Ok(page(1, 3, 12, &["Cy"])));
        dir.push(Ok(page(1, 3, 12, &["Dee"])));
        let ctl = controller(dir.clone());
        ctl.fetch(1).await;
        ctl.change_page(2).await;

        ctl.change_sort("name").await;
        ctl.change_sort("name").await;
        let snap = ctl.snapshot();
        assert_eq!(snap.sort_dir, SortDir::Desc);

        let requests = dir.recorded_requests();
        // Sort changes always request page 1
        assert_eq!(requests[2].page, 1);
        assert_eq!(requests[2].sort_by.as_deref(), Some("name"));
        assert_eq!(requests[2].sort_dir, SortDir::Asc);
        assert_eq!(requests[3].sort_dir, SortDir::Desc);
    }

    #[tokio::test]
    async fn test_sort_on_different_column_starts_ascending() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 1, 2, &["Ada", "Bo"])));
        dir.push(Ok(page(1, 1, 2, &["Ada", "Bo"])));
        dir.push(Ok(page(1, 1, 2, &["Ada", "Bo"])));
        let ctl = controller(dir.clone());

        ctl.change_sort("name").await;
        ctl.change_sort("name").await;
        assert_eq!(ctl.snapshot().sort_dir, SortDir::Desc);

        ctl.change_sort("email").await;
        let snap = ctl.snapshot();
        assert_eq!(snap.sort_by.as_deref(), Some("email"));
        assert_eq!(snap.sort_dir, SortDir::Asc);
    }

    // ========================================================================
    // Stale Response Guard Tests
    // ========================================================================

    #[tokio::test]
    async fn test_stale_response_does_not_overwrite_newer_state() {
        let dir = ScriptedDirectory::new();
        // First fetch (page 2) is held back; the superseding sorted fetch
        // for page 1 completes immediately.
        let gate = dir.push_gated(Ok(page(2, 3, 12, &["Old", "Stale"])));
        dir.push(Ok(page(1, 3, 12, &["Fresh"])));
        let ctl = controller(dir.clone());

        let bg = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.fetch(2).await })
        };
        gate.started.notified().await;

        // A sort change supersedes the in-flight page-2 fetch
        assert_eq!(ctl.change_sort("name").await, FetchOutcome::Applied);
        let snap = ctl.snapshot();
        assert_eq!(snap.current_page, 1);
        assert_eq!(snap.items[0].name, "Fresh");

        // Now let the page-2 response land; it must be discarded
        gate.release.notify_one();
        assert_eq!(bg.await.unwrap(), FetchOutcome::DiscardedStale);

        let snap = ctl.snapshot();
        assert_eq!(snap.current_page, 1);
        assert_eq!(snap.items[0].name, "Fresh");
        assert!(!snap.loading);
    }

    // ========================================================================
    // Failure Classification Tests
    // ========================================================================

    #[tokio::test]
    async fn test_connection_failure_sets_status_without_error_text() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 1, 1, &["Ada"])));
        dir.push(Err(Error::Connection));
        let ctl = controller(dir.clone());
        ctl.fetch(1).await;

        let outcome = ctl.refresh().await;

        assert_eq!(outcome, FetchOutcome::Failed);
        let snap = ctl.snapshot();
        assert_eq!(snap.connection, ConnectionStatus::Failed);
        // Banner precedence: no generic error text for connection failures
        assert!(snap.error.is_none());
        // Items are kept from the last good fetch
        assert_eq!(snap.items.len(), 1);
    }

    #[tokio::test]
    async fn test_request_failure_sets_descriptive_error() {
        let dir = ScriptedDirectory::new();
        dir.push(Err(Error::unexpected("Failed to fetch users")));
        let ctl = controller(dir.clone());

        let outcome = ctl.fetch(1).await;

        assert_eq!(outcome, FetchOutcome::Failed);
        let snap = ctl.snapshot();
        assert_eq!(snap.connection, ConnectionStatus::Failed);
        assert_eq!(snap.error.as_deref(), Some("Failed to fetch users"));
    }

    #[tokio::test]
    async fn test_unauthorized_is_reported_without_view_error() {
        let dir = ScriptedDirectory::new();
        dir.push(Err(Error::Auth));
        let ctl = controller(dir.clone());

        let outcome = ctl.fetch(1).await;

        assert_eq!(outcome, FetchOutcome::Unauthorized);
        assert!(ctl.snapshot().error.is_none());
    }

    // ========================================================================
    // Lookup Tests
    // ========================================================================

    #[tokio::test]
    async fn test_find_item_by_id() {
        let dir = ScriptedDirectory::new();
        dir.push(Ok(page(1, 1, 2, &["Ada", "Bo"])));
        let ctl = controller(dir.clone());
        ctl.fetch(1).await;

        let found = ctl.find_item(100).unwrap();
        assert_eq!(found.name, "Ada");
        assert!(ctl.find_item(999).is_none());
    }
}
