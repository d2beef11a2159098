//! Admin dashboard.
//!
//! Whether the dashboard is offered depends on the cached user's role, which
//! is a convenience for the UI and nothing more: `/admin/*` endpoints are
//! authorized by the server, and a non-admin token gets an error back no
//! matter what this client shows.
//!
//! Each tab loads its own data when activated. Loads are not cancelled, so a
//! slow response from an earlier activation of a tab can land after a newer
//! one and overwrite it.

use shared::{Movie, Showtime, Ticket, User};

use crate::api::{ApiClient, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminTab {
    Stats,
    Tickets,
    Users,
    Movies,
    Sessions,
}

impl AdminTab {
    pub const ALL: [AdminTab; 5] = [
        AdminTab::Stats,
        AdminTab::Tickets,
        AdminTab::Users,
        AdminTab::Movies,
        AdminTab::Sessions,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AdminTab::Stats => "Stats",
            AdminTab::Tickets => "Tickets",
            AdminTab::Users => "Users",
            AdminTab::Movies => "Movies",
            AdminTab::Sessions => "Sessions",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Management screens not built yet
    pub fn is_placeholder(&self) -> bool {
        matches!(self, AdminTab::Movies | AdminTab::Sessions)
    }
}

/// Whether to offer the dashboard. Not a security check.
pub fn can_open(user: Option<&User>) -> bool {
    user.map(User::is_admin).unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminStats {
    pub movies: usize,
    pub sessions: usize,
    pub active_sessions: usize,
    pub tickets: usize,
    pub users: usize,
    /// Sum of the `price` field over the fetched page of tickets only.
    /// Tickets without a `price` count as 0, even if they carry `total_price`.
    pub revenue: f64,
}

impl AdminStats {
    pub fn compute(movies: &[Movie], sessions: &[Showtime], tickets: &[Ticket], users: &[User]) -> Self {
        Self {
            movies: movies.len(),
            sessions: sessions.len(),
            active_sessions: sessions.iter().filter(|s| s.is_active).count(),
            tickets: tickets.len(),
            users: users.len(),
            revenue: tickets.iter().map(|t| t.price.unwrap_or(0.0)).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdminData {
    Stats(AdminStats),
    Tickets(Vec<Ticket>),
    Users(Vec<User>),
    Placeholder,
}

pub async fn load_tab(api: &ApiClient, tab: AdminTab) -> Result<AdminData, ApiError> {
    tracing::debug!("Loading admin tab {}", tab.title());
    let limit = api.page_limit();
    let data = match tab {
        AdminTab::Stats => {
            let (movies, sessions, tickets, users) = tokio::try_join!(
                api.movies(0, limit),
                api.sessions(0, limit),
                api.admin_tickets(),
                api.admin_users()
            )?;
            AdminData::Stats(AdminStats::compute(&movies, &sessions, &tickets, &users))
        }
        AdminTab::Tickets => AdminData::Tickets(api.admin_tickets().await?),
        AdminTab::Users => AdminData::Users(api.admin_users().await?),
        AdminTab::Movies | AdminTab::Sessions => AdminData::Placeholder,
    };
    Ok(data)
}

/// Transient state of the admin overlay
#[derive(Debug, Clone)]
pub struct AdminPanel {
    pub tab: AdminTab,
    pub stats: Option<AdminStats>,
    pub tickets: Vec<Ticket>,
    pub users: Vec<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AdminPanel {
    fn default() -> Self {
        Self {
            tab: AdminTab::Stats,
            stats: None,
            tickets: Vec::new(),
            users: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

impl AdminPanel {
    /// Switch tabs; the caller is expected to start a load for the new tab
    pub fn select(&mut self, tab: AdminTab) {
        self.tab = tab;
        self.loading = !tab.is_placeholder();
        self.error = None;
    }

    /// Store a load result. Results are kept per tab regardless of which
    /// tab is showing now.
    pub fn apply(&mut self, result: Result<AdminData, String>) {
        self.loading = false;
        match result {
            Ok(AdminData::Stats(stats)) => self.stats = Some(stats),
            Ok(AdminData::Tickets(tickets)) => self.tickets = tickets,
            Ok(AdminData::Users(users)) => self.users = users,
            Ok(AdminData::Placeholder) => {}
            Err(message) => self.error = Some(format!("Failed to load data: {}", message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, user_json};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tickets(prices: &[Option<f64>]) -> Vec<Ticket> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| serde_json::from_value(json!({"id": i, "price": p})).unwrap())
            .collect()
    }

    #[test]
    fn test_revenue_is_sum_of_ticket_prices() {
        let set = tickets(&[Some(350.0), Some(400.0), None]);
        let stats = AdminStats::compute(&[], &[], &set, &[]);
        assert_eq!(stats.tickets, 3);
        assert_eq!(stats.revenue, 750.0);

        let bigger = tickets(&[Some(350.0), Some(400.0), Some(250.0)]);
        let stats = AdminStats::compute(&[], &[], &bigger, &[]);
        assert_eq!(stats.revenue, 1000.0);
    }

    #[test]
    fn test_revenue_ignores_total_price() {
        let set: Vec<Ticket> = serde_json::from_value(json!([
            {"id": 1, "price": 300.0},
            {"id": 2, "seat_numbers": [3, 4], "total_price": 700.0}
        ]))
        .unwrap();
        let stats = AdminStats::compute(&[], &[], &set, &[]);
        assert_eq!(stats.revenue, 300.0);
    }

    #[test]
    fn test_active_session_count() {
        let sessions: Vec<Showtime> = serde_json::from_value(json!([
            {"id": 1, "is_active": true},
            {"id": 2, "is_active": false},
            {"id": 3}
        ]))
        .unwrap();
        let stats = AdminStats::compute(&[], &sessions, &[], &[]);
        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.active_sessions, 2);
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(AdminTab::Stats.next(), AdminTab::Tickets);
        assert_eq!(AdminTab::Sessions.next(), AdminTab::Stats);
        assert_eq!(AdminTab::Stats.prev(), AdminTab::Sessions);
        assert!(AdminTab::Movies.is_placeholder());
        assert!(!AdminTab::Users.is_placeholder());
    }

    #[test]
    fn test_can_open_is_role_based() {
        let admin: User = serde_json::from_value(user_json("admin")).unwrap();
        let manager: User = serde_json::from_value(user_json("manager")).unwrap();
        assert!(can_open(Some(&admin)));
        assert!(!can_open(Some(&manager)));
        assert!(!can_open(None));
    }

    #[test]
    fn test_panel_keeps_results_per_tab() {
        let mut panel = AdminPanel::default();
        panel.select(AdminTab::Users);
        panel.apply(Ok(AdminData::Tickets(tickets(&[Some(1.0)]))));
        assert_eq!(panel.tab, AdminTab::Users);
        assert_eq!(panel.tickets.len(), 1);
        assert!(!panel.loading);

        panel.select(AdminTab::Movies);
        assert!(!panel.loading);

        panel.apply(Err("403".to_string()));
        assert_eq!(panel.error.as_deref(), Some("Failed to load data: 403"));
    }

    #[tokio::test]
    async fn test_load_stats_tab() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let api = client_for(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/movies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "Dune"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2, "is_active": false}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/tickets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "price": 300.0}, {"id": 2, "price": 450.0}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json("admin")])))
            .mount(&server)
            .await;

        let data = load_tab(&api, AdminTab::Stats).await.unwrap();
        assert_eq!(
            data,
            AdminData::Stats(AdminStats {
                movies: 1,
                sessions: 2,
                active_sessions: 1,
                tickets: 2,
                users: 1,
                revenue: 750.0,
            })
        );
    }

    #[tokio::test]
    async fn test_forbidden_tab_reports_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let api = client_for(&server, &dir);

        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Admins only"})))
            .mount(&server)
            .await;

        let err = load_tab(&api, AdminTab::Users).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(load_tab(&api, AdminTab::Sessions).await.unwrap(), AdminData::Placeholder);
    }
}
