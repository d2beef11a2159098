//! "My account" view: profile details plus the user's tickets.

use shared::{Ticket, User};

pub fn status_label(status: &str) -> &str {
    match status {
        "active" => "Active",
        "used" => "Used",
        "cancelled" => "Cancelled",
        "pending" => "Pending confirmation",
        other => other,
    }
}

/// Status shown for a ticket; tickets without one fall back to payment state
pub fn ticket_status(ticket: &Ticket) -> String {
    match ticket.status.as_deref() {
        Some(status) => status_label(status).to_string(),
        None if ticket.is_settled() => "Confirmed".to_string(),
        None => "Pending confirmation".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileView {
    pub user: Option<User>,
    pub tickets: Vec<Ticket>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ProfileView {
    pub fn new(user: Option<User>) -> Self {
        Self {
            loading: user.is_some(),
            user,
            tickets: Vec::new(),
            error: None,
        }
    }

    pub fn apply(&mut self, result: Result<Vec<Ticket>, String>) {
        self.loading = false;
        match result {
            Ok(tickets) => {
                self.tickets = tickets;
                self.error = None;
            }
            Err(message) => self.error = Some(format!("Could not load tickets: {}", message)),
        }
    }
}
