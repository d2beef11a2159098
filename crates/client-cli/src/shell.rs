//! Application shell: top-level state and its transitions.
//!
//! The shell never performs I/O itself. Transitions return [`Effect`]s; the
//! terminal front end runs them with [`perform`] on background tasks and feeds
//! the resulting [`Outcome`]s (and any [`AppEvent`]s published meanwhile)
//! back in. Successful logins and bookings arrive as events, failures as
//! outcomes.
//!
//! Overlay flags are independent booleans, so more than one overlay can be
//! open at once; the front end draws the topmost by a fixed priority.

use shared::{Booking, Movie, Showtime, Ticket, TicketRequest, User};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::admin::{self, AdminData, AdminPanel, AdminTab};
use crate::api::{ApiClient, ApiError};
use crate::auth::AuthService;
use crate::booking::{self, BookingDraft};
use crate::catalog::{format_price, SessionCard};
use crate::config::Config;
use crate::events::AppEvent;
use crate::login::LoginForm;
use crate::profile::ProfileView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Login,
    Booking,
    Admin,
    Profile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modals {
    pub login: bool,
    pub booking: bool,
    pub profile: bool,
    pub admin: bool,
}

impl Modals {
    /// Topmost open overlay
    pub fn top(&self) -> Option<Overlay> {
        if self.login {
            Some(Overlay::Login)
        } else if self.booking {
            Some(Overlay::Booking)
        } else if self.admin {
            Some(Overlay::Admin)
        } else if self.profile {
            Some(Overlay::Profile)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellSettings {
    pub toast: Duration,
    pub seed_demo: bool,
    pub sessions_shown: usize,
    pub page_limit: u32,
}

impl From<&Config> for ShellSettings {
    fn from(config: &Config) -> Self {
        Self {
            toast: config.toast_duration(),
            seed_demo: config.ui.seed_demo,
            sessions_shown: config.ui.sessions_shown,
            page_limit: config.api.page_limit,
        }
    }
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Work the shell wants done
#[derive(Debug, Clone)]
pub enum Effect {
    Bootstrap,
    CheckAuth,
    HandleAuthError,
    RefreshCatalog,
    RefreshSessions,
    LoadOccupancy(i64),
    LoadProfile,
    LoadAdmin(AdminTab),
    SubmitLogin(LoginForm),
    SubmitBooking(TicketRequest),
    Logout,
}

/// Result of the initial load
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub user: Option<User>,
    pub catalog: Result<(Vec<Movie>, Vec<Showtime>), String>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Bootstrapped(Bootstrap),
    Authenticated(Option<User>),
    Catalog(Result<(Vec<Movie>, Vec<Showtime>), String>),
    Sessions(Result<Vec<Showtime>, String>),
    Occupancy {
        session_id: i64,
        result: Result<BTreeSet<u32>, String>,
    },
    Profile(Result<Vec<Ticket>, String>),
    Admin(Result<AdminData, String>),
    LoginFailed(String),
    BookingFailed(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Shell {
    pub phase: Phase,
    pub user: Option<User>,
    pub movies: Vec<Movie>,
    pub sessions: Vec<Showtime>,
    pub modals: Modals,
    pub login: LoginForm,
    pub booking: Option<BookingDraft>,
    pub profile: ProfileView,
    pub admin: AdminPanel,
    pub error: Option<String>,
    pub toast: Option<Toast>,
    settings: ShellSettings,
}

impl Shell {
    pub fn new(settings: ShellSettings) -> Self {
        Self {
            phase: Phase::Loading,
            user: None,
            movies: Vec::new(),
            sessions: Vec::new(),
            modals: Modals::default(),
            login: LoginForm::default(),
            booking: None,
            profile: ProfileView::default(),
            admin: AdminPanel::default(),
            error: None,
            toast: None,
            settings,
        }
    }

    pub fn start(&mut self) -> Vec<Effect> {
        self.phase = Phase::Loading;
        vec![Effect::Bootstrap]
    }

    /// Sessions listed on the catalog screen
    pub fn visible_sessions(&self) -> &[Showtime] {
        let n = self.sessions.len().min(self.settings.sessions_shown);
        &self.sessions[..n]
    }

    // ========================================================================
    // User actions
    // ========================================================================

    pub fn request_booking(&mut self, showtime: &Showtime) -> Vec<Effect> {
        if self.user.is_none() {
            tracing::debug!("Booking requested while logged out, opening login");
            self.modals.login = true;
            return Vec::new();
        }
        let Some(showtime) = SessionCard::from(showtime).activate(showtime) else {
            return Vec::new();
        };
        self.booking = Some(BookingDraft::new(showtime.clone()));
        self.modals.booking = true;
        vec![Effect::LoadOccupancy(showtime.id)]
    }

    pub fn open_profile(&mut self) -> Vec<Effect> {
        if self.user.is_none() {
            self.modals.login = true;
            return Vec::new();
        }
        self.profile = ProfileView::new(self.user.clone());
        self.modals.profile = true;
        vec![Effect::LoadProfile]
    }

    pub fn open_admin(&mut self) -> Vec<Effect> {
        self.admin = AdminPanel::default();
        self.modals.admin = true;
        if admin::can_open(self.user.as_ref()) {
            vec![Effect::LoadAdmin(AdminTab::Stats)]
        } else {
            self.admin.loading = false;
            self.admin.error = Some("Access denied. Administrators only.".to_string());
            Vec::new()
        }
    }

    pub fn select_admin_tab(&mut self, tab: AdminTab) -> Vec<Effect> {
        if !admin::can_open(self.user.as_ref()) {
            return Vec::new();
        }
        self.admin.select(tab);
        if tab.is_placeholder() {
            Vec::new()
        } else {
            vec![Effect::LoadAdmin(tab)]
        }
    }

    pub fn submit_login(&mut self) -> Vec<Effect> {
        if self.login.submitting {
            return Vec::new();
        }
        if let Err(message) = self.login.validate() {
            self.login.error = Some(message);
            return Vec::new();
        }
        self.login.submitting = true;
        self.login.error = None;
        vec![Effect::SubmitLogin(self.login.clone())]
    }

    pub fn submit_booking(&mut self) -> Vec<Effect> {
        let Some(draft) = self.booking.as_mut() else {
            return Vec::new();
        };
        if draft.submitting {
            return Vec::new();
        }
        match draft.request() {
            Ok(request) => {
                draft.submitting = true;
                draft.error = None;
                vec![Effect::SubmitBooking(request)]
            }
            Err(e) => {
                draft.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    pub fn logout(&mut self) -> Vec<Effect> {
        vec![Effect::Logout]
    }

    pub fn refresh(&mut self) -> Vec<Effect> {
        vec![Effect::RefreshCatalog]
    }

    /// Close the topmost overlay, if any
    pub fn close_top(&mut self) {
        match self.modals.top() {
            Some(Overlay::Login) => {
                self.modals.login = false;
                self.login = LoginForm::default();
            }
            Some(Overlay::Booking) => {
                self.modals.booking = false;
                self.booking = None;
            }
            Some(Overlay::Admin) => self.modals.admin = false,
            Some(Overlay::Profile) => self.modals.profile = false,
            None => {}
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // ========================================================================
    // Transitions driven by results
    // ========================================================================

    pub fn login_succeeded(&mut self, user: User) -> Vec<Effect> {
        tracing::info!("Login succeeded for {}", user.username);
        self.user = Some(user);
        self.modals.login = false;
        self.login = LoginForm::default();
        self.error = None;
        vec![Effect::RefreshCatalog]
    }

    pub fn booking_succeeded(&mut self, booking: &Booking, now: Instant) -> Vec<Effect> {
        self.modals.booking = false;
        self.booking = None;

        let message = if booking.seat_numbers.is_empty() {
            "🎉 Tickets booked!".to_string()
        } else {
            let seats: Vec<String> = booking.seat_numbers.iter().map(u32::to_string).collect();
            format!(
                "🎉 Tickets booked! Seats: {}, total: {}",
                seats.join(", "),
                format_price(booking.total_price)
            )
        };
        self.toast = Some(Toast {
            message,
            expires_at: now + self.settings.toast,
        });
        vec![Effect::RefreshSessions]
    }

    /// Drop the toast once it has expired
    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
        }
    }

    pub fn apply_event(&mut self, event: AppEvent, now: Instant) -> Vec<Effect> {
        match event {
            AppEvent::AuthError => {
                self.user = None;
                vec![Effect::HandleAuthError]
            }
            AppEvent::LoginSucceeded(user) => self.login_succeeded(user),
            AppEvent::LoggedOut => {
                *self = Shell::new(self.settings.clone());
                self.start()
            }
            AppEvent::OpenLogin => {
                self.modals.login = true;
                Vec::new()
            }
            AppEvent::OpenProfile => self.open_profile(),
            AppEvent::OpenAdmin => self.open_admin(),
            AppEvent::BookingSucceeded(booking) => self.booking_succeeded(&booking, now),
            AppEvent::StorageChanged => vec![Effect::CheckAuth],
        }
    }

    pub fn apply_outcome(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Bootstrapped(bootstrap) => {
                self.user = bootstrap.user;
                match bootstrap.catalog {
                    Ok((movies, sessions)) => {
                        self.movies = movies;
                        self.sessions = sessions;
                    }
                    Err(message) => self.error = Some(format!("Failed to load data: {}", message)),
                }
                self.phase = Phase::Ready;
            }
            Outcome::Authenticated(user) => self.user = user,
            Outcome::Catalog(Ok((movies, sessions))) => {
                self.movies = movies;
                self.sessions = sessions;
            }
            Outcome::Catalog(Err(message)) => {
                tracing::warn!("Catalog refresh failed: {}", message);
            }
            Outcome::Sessions(Ok(sessions)) => self.sessions = sessions,
            Outcome::Sessions(Err(message)) => {
                tracing::warn!("Session refresh failed: {}", message);
            }
            Outcome::Occupancy { session_id, result } => {
                if let Some(draft) = self.booking.as_mut().filter(|d| d.showtime.id == session_id) {
                    draft.apply_occupancy(result);
                }
            }
            Outcome::Profile(result) => self.profile.apply(result),
            Outcome::Admin(result) => self.admin.apply(result),
            Outcome::LoginFailed(message) => {
                self.login.submitting = false;
                self.login.error = Some(message);
            }
            Outcome::BookingFailed(message) => {
                if let Some(draft) = self.booking.as_mut() {
                    draft.submitting = false;
                    draft.error = Some(message);
                }
            }
            Outcome::Failed(message) => self.error = Some(message),
        }
        Vec::new()
    }
}

// ============================================================================
// Effect execution
// ============================================================================

/// Explicitly constructed service objects handed to whoever runs effects
#[derive(Debug, Clone)]
pub struct Services {
    pub api: ApiClient,
    pub auth: AuthService,
    pub settings: ShellSettings,
}

/// Validate a stored token against the server.
///
/// A token the server rejects is dropped without ceremony. If the server
/// cannot be reached the cached user is kept.
pub async fn check_authentication(api: &ApiClient, auth: &AuthService) -> Option<User> {
    if !auth.is_authenticated() {
        return None;
    }
    match api.current_user().await {
        Ok(user) => {
            if let Err(e) = api.store().set_user(&user) {
                tracing::warn!("Failed to cache user: {}", e);
            }
            Some(user)
        }
        Err(ApiError::Transport(e)) => {
            tracing::warn!("Could not validate token, server unreachable: {}", e);
            auth.current_user()
        }
        Err(e) => {
            tracing::info!("Token validation failed: {}", e);
            if let Err(e) = api.store().clear() {
                tracing::warn!("Failed to clear credentials: {}", e);
            }
            None
        }
    }
}

pub async fn load_catalog(api: &ApiClient, limit: u32) -> Result<(Vec<Movie>, Vec<Showtime>), ApiError> {
    tokio::try_join!(api.movies(0, limit), api.sessions(0, limit))
}

/// Token check, optional demo seed, then movies and sessions in parallel
pub async fn bootstrap(services: &Services) -> Bootstrap {
    let api = &services.api;
    let user = check_authentication(api, &services.auth).await;

    if services.settings.seed_demo {
        match api.populate_demo().await {
            Ok(_) => tracing::info!("Demo data populated"),
            Err(e) => tracing::debug!("Demo data already exists or error: {}", e),
        }
    }

    let catalog = load_catalog(api, services.settings.page_limit)
        .await
        .map_err(|e| e.to_string());

    Bootstrap { user, catalog }
}

/// Run one effect. Successes of login and booking are published on the
/// event bus; everything else comes back as an outcome.
pub async fn perform(services: &Services, effect: Effect) -> Option<Outcome> {
    let api = &services.api;
    let limit = services.settings.page_limit;
    match effect {
        Effect::Bootstrap => Some(Outcome::Bootstrapped(bootstrap(services).await)),
        Effect::CheckAuth => Some(Outcome::Authenticated(
            check_authentication(api, &services.auth).await,
        )),
        Effect::HandleAuthError => match services.auth.handle_auth_error() {
            Ok(_) => None,
            Err(e) => Some(Outcome::Failed(e.to_string())),
        },
        Effect::RefreshCatalog => Some(Outcome::Catalog(
            load_catalog(api, limit).await.map_err(|e| e.to_string()),
        )),
        Effect::RefreshSessions => Some(Outcome::Sessions(
            api.sessions(0, limit).await.map_err(|e| e.to_string()),
        )),
        Effect::LoadOccupancy(session_id) => Some(Outcome::Occupancy {
            session_id,
            result: booking::load_occupancy(api, session_id)
                .await
                .map_err(|e| e.to_string()),
        }),
        Effect::LoadProfile => Some(Outcome::Profile(
            api.my_tickets().await.map_err(|e| e.to_string()),
        )),
        Effect::LoadAdmin(tab) => Some(Outcome::Admin(
            admin::load_tab(api, tab).await.map_err(|e| e.to_string()),
        )),
        Effect::SubmitLogin(form) => match form.submit(api).await {
            Ok(user) => {
                api.events().publish(AppEvent::LoginSucceeded(user));
                None
            }
            Err(message) => Some(Outcome::LoginFailed(message)),
        },
        Effect::SubmitBooking(request) => match api.create_ticket(&request).await {
            Ok(booking) => {
                api.events().publish(AppEvent::BookingSucceeded(booking));
                None
            }
            Err(e) => Some(Outcome::BookingFailed(e.to_string())),
        },
        Effect::Logout => match services.auth.logout() {
            Ok(()) => None,
            Err(e) => Some(Outcome::Failed(e.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, user_json};
    use crate::events::EventBus;
    use crate::storage::CredentialStore;
    use serde_json::json;
    use shared::Hall;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn services(server: &MockServer, dir: &tempfile::TempDir) -> Services {
        let api = client_for(server, dir);
        let auth = AuthService::new(api.store().clone(), api.events().clone());
        Services {
            api,
            auth,
            settings: ShellSettings::default(),
        }
    }

    fn user() -> User {
        serde_json::from_value(user_json("customer")).unwrap()
    }

    fn showtime(id: i64, available: u32) -> Showtime {
        Showtime {
            id,
            movie_id: None,
            hall_id: None,
            movie: None,
            hall: Some(Hall {
                capacity: Some(20),
                ..Hall::default()
            }),
            price: 300.0,
            start_time: String::new(),
            available_seats: available,
            is_active: true,
        }
    }

    async fn mount_catalog(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/movies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "Dune"}])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "available_seats": 3}])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_rejected_token_leaves_logged_out_view() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, &dir);
        services.api.store().set_token("stale").unwrap();
        services.api.store().set_user(&user()).unwrap();

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/demo/populate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;
        mount_catalog(&server).await;

        let mut shell = Shell::new(ShellSettings::default());
        assert_eq!(shell.start().len(), 1);
        let outcome = perform(&services, Effect::Bootstrap).await.unwrap();
        shell.apply_outcome(outcome);

        assert_eq!(shell.phase, Phase::Ready);
        assert!(shell.user.is_none());
        assert!(!services.auth.is_authenticated());
        assert!(services.auth.current_user().is_none());
        assert_eq!(shell.movies.len(), 1);
        assert_eq!(shell.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_server_keeps_cached_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CredentialStore::open(dir.path().join("session.json")));
        let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2), store, EventBus::new()).unwrap();
        let auth = AuthService::new(api.store().clone(), api.events().clone());
        let services = Services {
            api,
            auth,
            settings: ShellSettings {
                seed_demo: false,
                ..ShellSettings::default()
            },
        };
        services.api.store().set_token("tok").unwrap();
        services.api.store().set_user(&user()).unwrap();

        let mut shell = Shell::new(services.settings.clone());
        let outcome = perform(&services, Effect::Bootstrap).await.unwrap();
        shell.apply_outcome(outcome);

        assert_eq!(shell.user, Some(user()));
        assert!(services.auth.is_authenticated());
        assert!(shell.error.as_deref().unwrap().starts_with("Failed to load data"));
    }

    #[tokio::test]
    async fn test_storage_change_resyncs_user() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer from-other-window"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("customer")))
            .expect(1)
            .mount(&server)
            .await;

        let mut shell = Shell::new(ShellSettings::default());
        shell.phase = Phase::Ready;

        // Another process sharing the credential file logs in
        let other = CredentialStore::open(dir.path().join("session.json"));
        other.set_token("from-other-window").unwrap();

        let effects = shell.apply_event(AppEvent::StorageChanged, Instant::now());
        assert!(matches!(effects.as_slice(), [Effect::CheckAuth]));
        for effect in effects {
            let outcome = perform(&services, effect).await.unwrap();
            assert!(shell.apply_outcome(outcome).is_empty());
        }
        assert_eq!(shell.user, Some(user()));
        assert_eq!(services.auth.current_user(), Some(user()));

        // ...and then logs out
        other.clear().unwrap();
        let effects = shell.apply_event(AppEvent::StorageChanged, Instant::now());
        for effect in effects {
            let outcome = perform(&services, effect).await.unwrap();
            shell.apply_outcome(outcome);
        }
        assert!(shell.user.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_swallows_demo_seed_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/demo/populate"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        mount_catalog(&server).await;

        let boot = bootstrap(&services).await;
        assert!(boot.user.is_none());
        assert!(boot.catalog.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_catalog_failure_shows_banner() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut services = services(&server, &dir);
        services.settings.seed_demo = false;

        Mock::given(method("GET"))
            .and(path("/movies"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut shell = Shell::new(services.settings.clone());
        let outcome = perform(&services, Effect::Bootstrap).await.unwrap();
        shell.apply_outcome(outcome);
        assert_eq!(shell.phase, Phase::Ready);
        assert!(shell.error.as_deref().unwrap().starts_with("Failed to load data"));
    }

    #[tokio::test]
    async fn test_login_success_closes_login_and_stores_user() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, &dir);
        let mut events = services.api.events().subscribe();

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "jwt"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("customer")))
            .mount(&server)
            .await;

        let mut shell = Shell::new(ShellSettings::default());
        shell.phase = Phase::Ready;
        shell.apply_event(AppEvent::OpenLogin, Instant::now());
        assert_eq!(shell.modals.top(), Some(Overlay::Login));

        shell.login.username = "anna".to_string();
        shell.login.password = "secret".to_string();
        let effects = shell.submit_login();
        assert!(shell.login.submitting);
        let effect = effects.into_iter().next().unwrap();
        assert!(perform(&services, effect).await.is_none());

        let event = events.recv().await.unwrap();
        let effects = shell.apply_event(event, Instant::now());
        assert!(matches!(effects.as_slice(), [Effect::RefreshCatalog]));
        assert!(!shell.modals.login);
        assert_eq!(shell.user.as_ref().map(|u| u.username.as_str()), Some("anna"));
        assert_eq!(services.auth.current_user(), shell.user);
    }

    #[tokio::test]
    async fn test_login_failure_stays_open_with_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let services = services(&server, &dir);

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})))
            .mount(&server)
            .await;

        let mut shell = Shell::new(ShellSettings::default());
        shell.modals.login = true;
        shell.login.username = "anna".to_string();
        shell.login.password = "nope".to_string();
        let effect = shell.submit_login().pop().unwrap();
        let outcome = perform(&services, effect).await.unwrap();
        shell.apply_outcome(outcome);

        assert!(shell.modals.login);
        assert!(!shell.login.submitting);
        assert_eq!(shell.login.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_booking_requires_login() {
        let mut shell = Shell::new(ShellSettings::default());
        let effects = shell.request_booking(&showtime(1, 5));
        assert!(effects.is_empty());
        assert!(shell.modals.login);
        assert!(!shell.modals.booking);
    }

    #[test]
    fn test_sold_out_session_cannot_be_booked() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        assert!(shell.request_booking(&showtime(1, 0)).is_empty());
        assert!(!shell.modals.booking);
        assert!(shell.booking.is_none());

        let effects = shell.request_booking(&showtime(2, 4));
        assert!(matches!(effects.as_slice(), [Effect::LoadOccupancy(2)]));
        assert!(shell.modals.booking);
    }

    #[test]
    fn test_empty_booking_is_rejected_locally() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        shell.request_booking(&showtime(2, 4));

        assert!(shell.submit_booking().is_empty());
        let draft = shell.booking.as_ref().unwrap();
        assert_eq!(draft.error.as_deref(), Some("Select at least one seat"));
        assert!(!draft.submitting);
    }

    #[test]
    fn test_occupancy_for_other_session_ignored() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        shell.request_booking(&showtime(2, 4));
        shell.apply_outcome(Outcome::Occupancy {
            session_id: 99,
            result: Ok(BTreeSet::from([1])),
        });
        let draft = shell.booking.as_ref().unwrap();
        assert!(!draft.map().seat(1).unwrap().booked);

        shell.apply_outcome(Outcome::Occupancy {
            session_id: 2,
            result: Ok(BTreeSet::from([1])),
        });
        assert!(shell.booking.as_ref().unwrap().map().seat(1).unwrap().booked);
    }

    #[test]
    fn test_booking_success_toast_expires() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        shell.request_booking(&showtime(2, 4));
        shell.booking.as_mut().unwrap().toggle(3).unwrap();
        assert_eq!(shell.submit_booking().len(), 1);

        let now = Instant::now();
        let booking = Booking {
            tickets: Vec::new(),
            seat_numbers: vec![3],
            total_price: 300.0,
        };
        let effects = shell.apply_event(AppEvent::BookingSucceeded(booking), now);
        assert!(matches!(effects.as_slice(), [Effect::RefreshSessions]));
        assert!(!shell.modals.booking);
        assert!(shell.booking.is_none());
        let toast = shell.toast.clone().unwrap();
        assert_eq!(toast.message, "🎉 Tickets booked! Seats: 3, total: 300 ₽");

        shell.tick(now + Duration::from_secs(4));
        assert!(shell.toast.is_some());
        shell.tick(now + Duration::from_secs(5));
        assert!(shell.toast.is_none());
    }

    #[test]
    fn test_auth_error_clears_user() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        let effects = shell.apply_event(AppEvent::AuthError, Instant::now());
        assert!(shell.user.is_none());
        assert!(matches!(effects.as_slice(), [Effect::HandleAuthError]));
    }

    #[test]
    fn test_logged_out_resets_everything() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.phase = Phase::Ready;
        shell.user = Some(user());
        shell.movies = vec![serde_json::from_value(json!({"id": 1, "title": "Dune"})).unwrap()];
        shell.modals.profile = true;

        let effects = shell.apply_event(AppEvent::LoggedOut, Instant::now());
        assert!(matches!(effects.as_slice(), [Effect::Bootstrap]));
        assert_eq!(shell.phase, Phase::Loading);
        assert!(shell.user.is_none());
        assert!(shell.movies.is_empty());
        assert_eq!(shell.modals, Modals::default());
    }

    #[test]
    fn test_admin_gate_is_local_hint() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        assert!(shell.open_admin().is_empty());
        assert!(shell.modals.admin);
        assert!(shell.admin.error.is_some());
        assert!(shell.select_admin_tab(AdminTab::Users).is_empty());

        shell.user = Some(serde_json::from_value(user_json("admin")).unwrap());
        let effects = shell.open_admin();
        assert!(matches!(effects.as_slice(), [Effect::LoadAdmin(AdminTab::Stats)]));
        assert!(shell.select_admin_tab(AdminTab::Movies).is_empty());
        assert!(matches!(
            shell.select_admin_tab(AdminTab::Tickets).as_slice(),
            [Effect::LoadAdmin(AdminTab::Tickets)]
        ));
    }

    #[test]
    fn test_overlays_close_top_first() {
        let mut shell = Shell::new(ShellSettings::default());
        shell.user = Some(user());
        shell.open_profile();
        shell.request_booking(&showtime(1, 2));
        shell.modals.login = true;

        shell.close_top();
        assert_eq!(shell.modals.top(), Some(Overlay::Booking));
        shell.close_top();
        assert!(shell.booking.is_none());
        assert_eq!(shell.modals.top(), Some(Overlay::Profile));
        shell.close_top();
        assert_eq!(shell.modals.top(), None);
    }

    #[test]
    fn test_visible_sessions_capped() {
        let mut shell = Shell::new(ShellSettings {
            sessions_shown: 2,
            ..ShellSettings::default()
        });
        shell.sessions = (1..=5).map(|id| showtime(id, 1)).collect();
        assert_eq!(shell.visible_sessions().len(), 2);
    }
}
