//! Seat map and booking flow for one showtime.
//!
//! The seat grid is laid out from hall metadata. Which seats are taken comes
//! from the tickets the server reports for the showtime; the server still
//! has the final word and rejects a booking that collides.

use shared::{Booking, Hall, Showtime, Ticket, TicketRequest};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};

pub const DEFAULT_CAPACITY: u32 = 100;
/// Upper bound on the seats laid out for one hall
pub const MAX_CAPACITY: u32 = 10_000;
const FALLBACK_SEATS_PER_ROW: u32 = 10;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Select at least one seat")]
    NoSeats,
    #[error("Seat {0} is already taken")]
    SeatTaken(u32),
    #[error("There is no seat {0} in this hall")]
    NoSuchSeat(u32),
    #[error("Seating plan is not available for this session")]
    NoSeatingPlan,
    #[error(transparent)]
    Api(#[from] ApiError),
}

// ============================================================================
// Layout
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HallLayout {
    pub total: u32,
    pub rows: u32,
    pub per_row: u32,
}

impl HallLayout {
    /// Fill in whatever the hall record leaves out. Zero counts as missing.
    /// Counts larger than the hall can hold are clamped.
    pub fn from_hall(hall: &Hall) -> Self {
        let positive = |v: Option<u32>| v.filter(|&n| n > 0);
        let mut total = hall.seat_count().unwrap_or(DEFAULT_CAPACITY);
        if total > MAX_CAPACITY {
            tracing::warn!("Hall reports {} seats, laying out {}", total, MAX_CAPACITY);
            total = MAX_CAPACITY;
        }
        let rows = positive(hall.rows)
            .unwrap_or_else(|| total.div_ceil(FALLBACK_SEATS_PER_ROW))
            .min(total);
        let per_row = positive(hall.seats_per_row)
            .unwrap_or_else(|| total.div_ceil(rows))
            .min(total);
        Self { total, rows, per_row }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seat {
    pub number: u32,
    /// 1-based
    pub row: u32,
    /// 1-based position within the row
    pub seat: u32,
    pub booked: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatMap {
    rows: Vec<Vec<Seat>>,
}

impl SeatMap {
    pub fn build(layout: HallLayout, occupied: &BTreeSet<u32>) -> Self {
        let mut rows = Vec::new();
        for row in 0..layout.rows {
            let first = match row.checked_mul(layout.per_row) {
                Some(first) if first < layout.total => first,
                _ => break,
            };
            let seats: Vec<Seat> = (0..layout.per_row)
                .map_while(|seat| first.checked_add(seat + 1))
                .take_while(|&number| number <= layout.total)
                .enumerate()
                .map(|(idx, number)| Seat {
                    number,
                    row: row + 1,
                    seat: idx as u32 + 1,
                    booked: occupied.contains(&number),
                })
                .collect();
            if !seats.is_empty() {
                rows.push(seats);
            }
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Seat>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn seat(&self, number: u32) -> Option<&Seat> {
        self.rows.iter().flatten().find(|s| s.number == number)
    }

    pub fn free_count(&self) -> usize {
        self.rows.iter().flatten().filter(|s| !s.booked).count()
    }
}

/// Seat numbers already sold, according to the server's ticket list
pub fn occupied_seats(tickets: &[Ticket]) -> BTreeSet<u32> {
    tickets.iter().flat_map(|t| t.seats()).collect()
}

pub async fn load_occupancy(api: &ApiClient, session_id: i64) -> Result<BTreeSet<u32>, ApiError> {
    let tickets = api.session_tickets(session_id).await?;
    Ok(occupied_seats(&tickets))
}

// ============================================================================
// Selection
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatSelection {
    seats: BTreeSet<u32>,
}

impl SeatSelection {
    /// Flip membership; returns whether the seat is selected afterwards
    pub fn toggle(&mut self, number: u32) -> bool {
        if !self.seats.remove(&number) {
            self.seats.insert(number);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, number: u32) -> bool {
        self.seats.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Ascending
    pub fn seat_numbers(&self) -> Vec<u32> {
        self.seats.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }

    fn retain(&mut self, keep: impl Fn(u32) -> bool) {
        self.seats.retain(|&n| keep(n));
    }
}

// ============================================================================
// Draft
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Occupancy {
    Loading,
    Known,
    /// Could not be fetched; every seat is shown as free
    Unavailable(String),
}

/// Transient state of the booking overlay for one showtime
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub showtime: Showtime,
    map: SeatMap,
    layout: Option<HallLayout>,
    pub selection: SeatSelection,
    pub occupancy: Occupancy,
    /// (row index, seat index) into the map
    pub cursor: (usize, usize),
    pub submitting: bool,
    pub error: Option<String>,
}

impl BookingDraft {
    pub fn new(showtime: Showtime) -> Self {
        let layout = showtime.hall.as_ref().map(HallLayout::from_hall);
        let map = layout
            .map(|l| SeatMap::build(l, &BTreeSet::new()))
            .unwrap_or_default();
        if layout.is_none() {
            tracing::debug!("Showtime {} has no hall data, seat map is empty", showtime.id);
        }
        Self {
            showtime,
            map,
            layout,
            selection: SeatSelection::default(),
            occupancy: Occupancy::Loading,
            cursor: (0, 0),
            submitting: false,
            error: None,
        }
    }

    pub fn map(&self) -> &SeatMap {
        &self.map
    }

    /// Mark sold seats. Any selected seat that turned out to be sold is dropped.
    pub fn apply_occupancy(&mut self, result: Result<BTreeSet<u32>, String>) {
        match result {
            Ok(occupied) => {
                if let Some(layout) = self.layout {
                    self.map = SeatMap::build(layout, &occupied);
                }
                self.selection.retain(|n| !occupied.contains(&n));
                self.occupancy = Occupancy::Known;
            }
            Err(message) => {
                tracing::warn!("Seat occupancy unavailable for showtime {}: {}", self.showtime.id, message);
                self.error = Some(format!("Could not load taken seats: {}", message));
                self.occupancy = Occupancy::Unavailable(message);
            }
        }
    }

    pub fn toggle(&mut self, number: u32) -> Result<bool, BookingError> {
        match self.map.seat(number) {
            None => Err(BookingError::NoSuchSeat(number)),
            Some(seat) if seat.booked => Err(BookingError::SeatTaken(number)),
            Some(_) => Ok(self.selection.toggle(number)),
        }
    }

    pub fn current_seat(&self) -> Option<&Seat> {
        let (row, col) = self.cursor;
        self.map.rows().get(row).and_then(|r| r.get(col))
    }

    pub fn toggle_at_cursor(&mut self) -> Result<bool, BookingError> {
        let number = self.current_seat().map(|s| s.number).ok_or(BookingError::NoSeatingPlan)?;
        self.toggle(number)
    }

    /// Move the cursor, clamped to the grid
    pub fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let rows = self.map.rows();
        if rows.is_empty() {
            return;
        }
        let row = (self.cursor.0 as isize + d_row).clamp(0, rows.len() as isize - 1) as usize;
        let width = rows[row].len();
        let col = (self.cursor.1 as isize + d_col).clamp(0, width as isize - 1) as usize;
        self.cursor = (row, col);
    }

    pub fn total_price(&self) -> f64 {
        self.selection.len() as f64 * self.showtime.price
    }

    /// The request to send, or why there is nothing to send
    pub fn request(&self) -> Result<TicketRequest, BookingError> {
        if self.selection.is_empty() {
            return Err(BookingError::NoSeats);
        }
        Ok(TicketRequest {
            session_id: self.showtime.id,
            seat_numbers: self.selection.seat_numbers(),
            total_price: self.total_price(),
        })
    }

    pub async fn submit(&self, api: &ApiClient) -> Result<Booking, BookingError> {
        let request = self.request()?;
        tracing::info!(
            "Booking seats {:?} for showtime {} ({:.2})",
            request.seat_numbers,
            request.session_id,
            request.total_price
        );
        Ok(api.create_ticket(&request).await?)
    }
}
