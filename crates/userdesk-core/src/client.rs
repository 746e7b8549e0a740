//! Backend REST API client
//!
//! Wraps every HTTP call to the user-management backend with:
//! - a fixed request timeout (requests that exceed it count as connection
//!   failures, not server errors)
//! - automatic bearer-token attachment from the session store
//! - a global 401 rule: any unauthorized response clears the session
//!   before the error reaches the caller
//!
//! Transport and status failures are classified into the closed error
//! taxonomy here; no other module inspects raw reqwest errors.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;

use crate::error::{classify_transport, Error, Result, GENERIC_ERROR_MESSAGE};
use crate::models::{
    ConnectionStatus, ErrorBody, LoginRequest, LoginResponse, Page, PageRequest,
    PasswordResetRequest, Role, SessionUser, User, UserDraft,
};
use crate::session::SessionStore;

/// Timeout for normal API calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Tighter timeout for the reachability probe
pub const PROBE_TIMEOUT_SECS: u64 = 3;

/// Result of a login attempt. Bad credentials are a normal outcome, not
/// an error: the caller shows the message and stays on the login view.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success(SessionUser),
    Failed(String),
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success(_))
    }
}

/// HTTP client for the user-management backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client against the given base URL, sharing the session store
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|err| Error::unexpected(format!("failed to build HTTP client: {}", err)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// The session store this client attaches tokens from
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request with the bearer token attached when one is stored
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send a request, applying transport classification and the global
    /// 401 rule. Callers still need to check non-401 status codes.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(classify_transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            log::warn!("backend returned 401, clearing session");
            self.session.clear();
            return Err(Error::Auth);
        }

        Ok(response)
    }

    /// Turn a non-success, non-401 response into a classified error
    async fn error_for(&self, response: Response) -> Error {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());

        match status {
            StatusCode::BAD_REQUEST => Error::Validation(message),
            _ => Error::Unexpected(message),
        }
    }

    async fn expect_success(&self, response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.error_for(response).await)
        }
    }

    /// Authenticate against the backend.
    ///
    /// On success the token and profile are stored. A 401 maps to a failed
    /// outcome carrying the backend message; a network failure maps to a
    /// failed outcome with a generic message. Neither is an `Err`.
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = match self
            .request(Method::POST, "/api/auth/login")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                log::debug!("login transport failure: {}", err);
                return LoginOutcome::Failed("Login failed".to_string());
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            // Wrong credentials. Clear any stale session as the global
            // 401 rule demands; the store is usually anonymous already.
            self.session.clear();
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Invalid username or password".to_string());
            return LoginOutcome::Failed(message);
        }

        let body: LoginResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => return LoginOutcome::Failed("Login failed".to_string()),
        };

        match (body.success, body.token, body.user) {
            (true, Some(token), Some(user)) => {
                if let Err(err) = self.session.store(&token, &user) {
                    return LoginOutcome::Failed(format!("Failed to save session: {}", err));
                }
                LoginOutcome::Success(user)
            }
            _ => LoginOutcome::Failed(
                body.message.unwrap_or_else(|| "Login failed".to_string()),
            ),
        }
    }

    /// Fetch one page of the user directory, optionally filtered by role
    pub async fn list_users(&self, role: Option<Role>, req: &PageRequest) -> Result<Page> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(role) = role {
            params.push(("userRole", role.as_str().to_string()));
        }
        params.push(("page", req.page.to_string()));
        params.push(("size", req.size.to_string()));
        if let Some(sort_by) = &req.sort_by {
            params.push(("sortBy", sort_by.clone()));
            params.push(("sortDir", req.sort_dir.as_str().to_string()));
        }

        let response = self
            .send(self.request(Method::GET, "/api/users").query(&params))
            .await?;
        let response = self.expect_success(response).await?;
        Ok(response.json().await.map_err(classify_transport)?)
    }

    /// Fetch the most recently created users (unpaginated, for the dashboard)
    pub async fn recent_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(role) = role {
            params.push(("userRole", role.as_str().to_string()));
        }

        let response = self
            .send(self.request(Method::GET, "/api/users/recent").query(&params))
            .await?;
        let response = self.expect_success(response).await?;
        Ok(response.json().await.map_err(classify_transport)?)
    }

    /// Create a new user account
    pub async fn create_user(&self, draft: &UserDraft) -> Result<User> {
        let response = self
            .send(self.request(Method::POST, "/api/users").json(draft))
            .await?;
        let response = self.expect_success(response).await?;
        Ok(response.json().await.map_err(classify_transport)?)
    }

    /// Update an existing user account
    pub async fn update_user(&self, id: u64, draft: &UserDraft) -> Result<User> {
        let path = format!("/api/users/{}", id);
        let response = self
            .send(self.request(Method::PUT, &path).json(draft))
            .await?;
        let response = self.expect_success(response).await?;
        Ok(response.json().await.map_err(classify_transport)?)
    }

    /// Delete a user account
    pub async fn delete_user(&self, id: u64) -> Result<()> {
        let path = format!("/api/users/{}", id);
        let response = self.send(self.request(Method::DELETE, &path)).await?;
        self.expect_success(response).await?;
        Ok(())
    }

    /// Change the current user's password. A 400 surfaces as a validation
    /// error carrying the backend message ("wrong current password").
    pub async fn reset_password(&self, current: &str, new: &str) -> Result<()> {
        let payload = PasswordResetRequest {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };

        let response = self
            .send(
                self.request(Method::POST, "/api/users/reset-password")
                    .json(&payload),
            )
            .await?;
        self.expect_success(response).await?;
        Ok(())
    }

    /// Minimal reachability probe: a HEAD request with a tight timeout.
    /// Any HTTP response at all counts as connected, including 401, so the
    /// probe bypasses `send` and never touches the session.
    pub async fn probe(&self) -> ConnectionStatus {
        let result = self
            .request(Method::HEAD, "/api/users")
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await;

        match result {
            Ok(_) => ConnectionStatus::Connected,
            Err(_) => ConnectionStatus::Failed,
        }
    }
}

#[async_trait::async_trait]
impl crate::listing::UserDirectory for ApiClient {
    async fn fetch_page(&self, role: Option<Role>, req: &PageRequest) -> Result<Page> {
        self.list_users(role, req).await
    }
}

#[async_trait::async_trait]
impl crate::crud::UserWriter for ApiClient {
    async fn create_user(&self, draft: &UserDraft) -> Result<User> {
        ApiClient::create_user(self, draft).await
    }

    async fn update_user(&self, id: u64, draft: &UserDraft) -> Result<User> {
        ApiClient::update_user(self, id, draft).await
    }

    async fn delete_user(&self, id: u64) -> Result<()> {
        ApiClient::delete_user(self, id).await
    }
}
