use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::wire::TicketRequest;

// ============================================================================
// Accounts
// ============================================================================

/// Account role as reported by the server
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Manager,
    Admin,
    /// Any role this client does not know about
    #[serde(other)]
    Other,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Manager => "Manager",
            Role::Customer | Role::Other => "Customer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// "First Last" when the server sent names, otherwise the username
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) if !first.is_empty() => format!("{} {}", first, last),
            (Some(first), _) if !first.is_empty() => first.clone(),
            _ => self.username.clone(),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub genre: String,
    /// Running time in minutes
    #[serde(default, alias = "duration_minutes")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// Auditorium metadata; only used to lay out a seat grid
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Hall {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub capacity: Option<u32>,
    /// Older name for `capacity`; some payloads carry both
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub total_seats: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub rows: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub seats_per_row: Option<u32>,
}

impl Hall {
    /// `capacity` if positive, else `total_seats` if positive
    pub fn seat_count(&self) -> Option<u32> {
        let positive = |v: Option<u32>| v.filter(|&n| n > 0);
        positive(self.capacity).or(positive(self.total_seats))
    }
}

/// A scheduled screening. The API calls these "sessions".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Showtime {
    pub id: i64,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub hall_id: Option<i64>,
    #[serde(default)]
    pub movie: Option<Movie>,
    #[serde(default)]
    pub hall: Option<Hall>,
    #[serde(default, alias = "base_price")]
    pub price: f64,
    #[serde(default)]
    pub start_time: String,
    /// Server-reported count; informational only
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub available_seats: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Showtime {
    pub fn title(&self) -> &str {
        self.movie.as_ref().map(|m| m.title.as_str()).unwrap_or("Movie")
    }

    pub fn hall_name(&self) -> &str {
        match &self.hall {
            Some(hall) if !hall.name.is_empty() => hall.name.as_str(),
            _ => "Hall",
        }
    }

    pub fn capacity(&self) -> u32 {
        self.hall.as_ref().and_then(Hall::seat_count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cinema {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// Tickets
// ============================================================================

/// A ticket as returned by the server.
///
/// Depending on the endpoint a ticket either covers a single seat
/// (`seat_number` + `price`) or a whole booking (`seat_numbers` +
/// `total_price`), so both shapes are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub session: Option<Showtime>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub seat_number: Option<u32>,
    #[serde(default)]
    pub seat_numbers: Vec<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub row_number: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub is_confirmed: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub booking_reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Ticket {
    /// Seats covered by this ticket
    pub fn seats(&self) -> Vec<u32> {
        if !self.seat_numbers.is_empty() {
            self.seat_numbers.clone()
        } else {
            self.seat_number.into_iter().collect()
        }
    }

    /// Price to show for this ticket: `price`, then `total_price`, then 0
    pub fn amount(&self) -> f64 {
        self.price.or(self.total_price).unwrap_or(0.0)
    }

    pub fn is_settled(&self) -> bool {
        self.is_paid.or(self.is_confirmed).unwrap_or(false)
    }

    pub fn showtime_id(&self) -> Option<i64> {
        self.session_id.or_else(|| self.session.as_ref().map(|s| s.id))
    }
}

/// Client-side summary of a successful booking request
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub tickets: Vec<Ticket>,
    pub seat_numbers: Vec<u32>,
    pub total_price: f64,
}

impl Booking {
    /// Summarize whatever the server returned for a booking request,
    /// falling back to the request itself for fields the response lacks.
    pub fn from_tickets(tickets: Vec<Ticket>, request: &TicketRequest) -> Self {
        let mut seat_numbers: Vec<u32> = tickets.iter().flat_map(|t| t.seats()).collect();
        seat_numbers.sort_unstable();
        seat_numbers.dedup();
        if seat_numbers.is_empty() {
            seat_numbers = request.seat_numbers.clone();
        }

        let charged: f64 = tickets.iter().map(|t| t.total_price.or(t.price).unwrap_or(0.0)).sum();
        let total_price = if charged > 0.0 { charged } else { request.total_price };

        Self {
            tickets,
            seat_numbers,
            total_price,
        }
    }
}

// ============================================================================
// System
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
