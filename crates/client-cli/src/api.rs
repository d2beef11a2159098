//! REST client for the cinema API.
//!
//! Attaches the stored bearer token to every request and folds every
//! failure into [`ApiError`]. A 401 additionally wipes stored credentials and
//! publishes [`AppEvent::AuthError`]; reacting to it (forced logout, UI reset)
//! is left to the listeners. Nothing is retried.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{
    Booking, Cinema, ErrorBody, Health, LoginForm, Movie, RegisterRequest, Showtime, Ticket,
    TicketRequest, TicketsResponse, TokenResponse, User,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::events::{AppEvent, EventBus};
use crate::storage::{CredentialStore, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(String),
    /// Non-2xx response other than 401
    #[error("{message}")]
    Api { status: u16, message: String },
    /// 401; credentials have already been cleared
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("Unexpected response from server: {0}")]
    Decode(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    page_limit: u32,
    store: Arc<CredentialStore>,
    events: EventBus,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<CredentialStore>,
        events: EventBus,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit: 100,
            store,
            events,
        })
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `body` as JSON (if any) and decode a JSON response
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut req = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        self.send(&method, path, req).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let req = match self.store.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        tracing::debug!("{} {}", method, path);

        let resp = req.send().await.map_err(|e| {
            tracing::warn!("API transport error [{} {}]: {}", method, path, e);
            ApiError::Transport(e.to_string())
        })?;

        let status = resp.status();
        if status.is_success() {
            let body = resp
                .bytes()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            // an empty success body decodes like JSON null
            let json: &[u8] = if body.is_empty() { b"null" } else { body.as_ref() };
            return serde_json::from_slice(json).map_err(|e| {
                tracing::warn!("API decode error [{} {}]: {}", method, path, e);
                ApiError::Decode(e.to_string())
            });
        }

        let text = resp.text().await.unwrap_or_default();
        let message = error_message(status, &text);
        tracing::warn!("API error [{} {}]: {} {}", method, path, status.as_u16(), message);

        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.store.clear() {
                tracing::warn!("Failed to clear credentials after 401: {}", e);
            }
            self.events.publish(AppEvent::AuthError);
            return Err(ApiError::Unauthorized { message });
        }

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    // ========================================================================
    // System
    // ========================================================================

    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get("/health").await
    }

    /// Ask the server to seed demo data. Idempotent on the server side.
    pub async fn populate_demo(&self) -> Result<serde_json::Value, ApiError> {
        self.get("/demo/populate").await
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Log in, store the token, then fetch and store the user record.
    ///
    /// If the user record cannot be fetched the fresh token is discarded.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let req = self.http.post(self.url("/auth/login")).form(&form);
        let token: TokenResponse = self.send(&Method::POST, "/auth/login", req).await?;
        self.store.set_token(&token.access_token)?;

        match self.current_user().await {
            Ok(user) => {
                self.store.set_user(&user)?;
                tracing::info!("Logged in as {}", user.username);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!("Could not load user profile after login: {}", e);
                if let Err(store_err) = self.store.remove_token() {
                    tracing::warn!("Failed to discard token: {}", store_err);
                }
                Err(e)
            }
        }
    }

    /// Create an account, then log in with the same credentials
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let created: User = self.request(Method::POST, "/auth/register", Some(request)).await?;
        tracing::info!("Registered account {}", created.username);
        self.login(&request.username, &request.password).await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/auth/me").await
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    pub async fn movies(&self, skip: u32, limit: u32) -> Result<Vec<Movie>, ApiError> {
        self.get(&format!("/movies?skip={}&limit={}", skip, limit)).await
    }

    pub async fn movie(&self, id: i64) -> Result<Movie, ApiError> {
        self.get(&format!("/movies/{}", id)).await
    }

    pub async fn sessions(&self, skip: u32, limit: u32) -> Result<Vec<Showtime>, ApiError> {
        self.get(&format!("/sessions?skip={}&limit={}", skip, limit)).await
    }

    pub async fn cinemas(&self) -> Result<Vec<Cinema>, ApiError> {
        self.get(&format!("/cinemas?skip=0&limit={}", self.page_limit)).await
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    pub async fn create_ticket(&self, request: &TicketRequest) -> Result<Booking, ApiError> {
        let resp: TicketsResponse = self.request(Method::POST, "/tickets", Some(request)).await?;
        Ok(Booking::from_tickets(resp.into_vec(), request))
    }

    pub async fn my_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get("/tickets/my").await
    }

    /// Tickets sold for one showtime; the source of seat occupancy
    pub async fn session_tickets(&self, session_id: i64) -> Result<Vec<Ticket>, ApiError> {
        self.get(&format!("/sessions/{}/tickets", session_id)).await
    }

    // ========================================================================
    // Admin
    // ========================================================================

    pub async fn admin_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        self.get(&format!("/admin/tickets?skip=0&limit={}", self.page_limit)).await
    }

    pub async fn admin_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(&format!("/admin/users?skip=0&limit={}", self.page_limit)).await
    }
}

/// Message from the body's `detail`, else a generic one naming the status
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message())
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}
