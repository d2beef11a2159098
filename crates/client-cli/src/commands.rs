//! One-shot catalog, booking and admin commands.

use anyhow::{anyhow, bail, Result};
use shared::{format_timestamp, Showtime};

use crate::admin::{self, AdminData, AdminTab};
use crate::api::ApiClient;
use crate::auth::AuthService;
use crate::booking::{self, BookingDraft, BookingError};
use crate::catalog::{format_price, MovieCard, SessionCard};
use crate::profile::ticket_status;

pub async fn health(api: &ApiClient) -> Result<()> {
    let health = api.health().await?;
    println!("\x1b[32m✓ {}\x1b[0m {}", health.status, api.base_url());
    if let Some(version) = health.version {
        println!("Version: {}", version);
    }
    if let Some(message) = health.message {
        println!("{}", message);
    }
    Ok(())
}

pub async fn movies(api: &ApiClient) -> Result<()> {
    let movies = api.movies(0, api.page_limit()).await?;
    if movies.is_empty() {
        println!("No movies yet");
    }
    for card in movies.iter().map(MovieCard::from) {
        println!(
            "\x1b[1m{:>4}  {}\x1b[0m  {}  {}  {}",
            card.id, card.title, card.genre, card.duration, card.rating
        );
        if !card.description.is_empty() {
            println!("      \x1b[90m{}\x1b[0m", card.description);
        }
    }
    Ok(())
}

pub async fn movie(api: &ApiClient, id: i64) -> Result<()> {
    let movie = api.movie(id).await?;
    let card = MovieCard::from(&movie);
    println!("\x1b[1m{}\x1b[0m  {}", card.title, card.rating);
    println!("{} · {}", card.genre, card.duration);
    if let Some(date) = &movie.release_date {
        println!("Released: {}", date);
    }
    if !card.description.is_empty() {
        println!();
        println!("{}", card.description);
    }
    Ok(())
}

pub async fn sessions(api: &ApiClient) -> Result<()> {
    let sessions = api.sessions(0, api.page_limit()).await?;
    if sessions.is_empty() {
        println!("No sessions scheduled");
    }
    for card in sessions.iter().map(SessionCard::from) {
        let action = if card.bookable {
            format!("\x1b[32m{}\x1b[0m", card.action_label())
        } else {
            format!("\x1b[90m{}\x1b[0m", card.action_label())
        };
        println!(
            "{:>4}  {:<28} {:<18} {:<12} {:>10}  {:<16} {}",
            card.id,
            card.title,
            card.starts,
            card.hall,
            card.price,
            card.seats_text(),
            action
        );
    }
    Ok(())
}

pub async fn cinemas(api: &ApiClient) -> Result<()> {
    for cinema in api.cinemas().await? {
        println!("{:>4}  \x1b[1m{}\x1b[0m  {}", cinema.id, cinema.name, cinema.address);
    }
    Ok(())
}

async fn find_showtime(api: &ApiClient, session_id: i64) -> Result<Showtime> {
    api.sessions(0, api.page_limit())
        .await?
        .into_iter()
        .find(|s| s.id == session_id)
        .ok_or_else(|| anyhow!("Session {} not found in the first {} sessions", session_id, api.page_limit()))
}

/// Seat map for a showtime with occupancy from the server
pub async fn load_draft(api: &ApiClient, session_id: i64) -> Result<BookingDraft> {
    let showtime = find_showtime(api, session_id).await?;
    let mut draft = BookingDraft::new(showtime);
    let occupancy = booking::load_occupancy(api, session_id)
        .await
        .map_err(|e| e.to_string());
    draft.apply_occupancy(occupancy);
    Ok(draft)
}

pub async fn seats(api: &ApiClient, session_id: i64) -> Result<()> {
    let draft = load_draft(api, session_id).await?;
    let show = &draft.showtime;
    println!(
        "\x1b[1m{}\x1b[0m · {} · {} · {}",
        show.title(),
        show.hall_name(),
        format_timestamp(&show.start_time),
        format_price(show.price)
    );
    if let Some(error) = &draft.error {
        println!("\x1b[33m⚠ {}\x1b[0m", error);
    }
    if draft.map().is_empty() {
        println!("Seating plan is not available for this session");
        return Ok(());
    }
    for row in draft.map().rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|seat| {
                if seat.booked {
                    "\x1b[90m  ×\x1b[0m".to_string()
                } else {
                    format!("{:>3}", seat.number)
                }
            })
            .collect();
        let label = row.first().map(|s| s.row).unwrap_or_default();
        println!("\x1b[90mR{:<3}\x1b[0m {}", label, cells.join(" "));
    }
    println!("{} seats free", draft.map().free_count());
    Ok(())
}

/// Select the given seats and submit the booking
pub async fn book_seats(api: &ApiClient, session_id: i64, seats: &[u32]) -> Result<shared::Booking> {
    let mut draft = load_draft(api, session_id).await?;
    if !SessionCard::from(&draft.showtime).bookable {
        return Err(anyhow!("Session {} is sold out", session_id));
    }
    for &seat in seats {
        if !draft.selection.contains(seat) {
            draft.toggle(seat)?;
        }
    }
    Ok(draft.submit(api).await?)
}

pub async fn book(api: &ApiClient, auth: &AuthService, session_id: i64, seats: &[u32]) -> Result<()> {
    if !auth.is_authenticated() {
        println!("   Run '\x1b[1mcinema login\x1b[0m' to authenticate.");
        bail!("Not logged in");
    }
    match book_seats(api, session_id, seats).await {
        Ok(booking) => {
            let seats: Vec<String> = booking.seat_numbers.iter().map(u32::to_string).collect();
            println!("\x1b[1;32m🎉 Tickets booked!\x1b[0m");
            println!("Seats: {}", seats.join(", "));
            println!("Total: {}", format_price(booking.total_price));
            Ok(())
        }
        Err(e) => match e.downcast_ref::<BookingError>() {
            Some(BookingError::SeatTaken(_)) | Some(BookingError::NoSuchSeat(_)) => {
                println!("Run '\x1b[1mcinema seats {}\x1b[0m' to see free seats", session_id);
                Err(e)
            }
            _ => Err(e),
        },
    }
}

pub async fn tickets(api: &ApiClient) -> Result<()> {
    let tickets = api.my_tickets().await?;
    if tickets.is_empty() {
        println!("No tickets yet");
    }
    for ticket in &tickets {
        let seats: Vec<String> = ticket.seats().iter().map(u32::to_string).collect();
        let (title, starts) = match &ticket.session {
            Some(s) => (s.title().to_string(), format_timestamp(&s.start_time)),
            None => ("Movie".to_string(), String::new()),
        };
        println!(
            "#{:<5} \x1b[1m{:<28}\x1b[0m {:<18} seats {:<10} {:>10}  {}",
            ticket.id,
            title,
            starts,
            seats.join(","),
            format_price(ticket.amount()),
            ticket_status(ticket)
        );
    }
    Ok(())
}

pub async fn admin(api: &ApiClient, auth: &AuthService, tab: AdminTab) -> Result<()> {
    if !auth.is_admin() {
        tracing::warn!("Cached user is not an administrator; the server will decide");
    }
    match admin::load_tab(api, tab).await? {
        AdminData::Stats(stats) => {
            println!("Movies:   {}", stats.movies);
            println!("Sessions: {} ({} active)", stats.sessions, stats.active_sessions);
            println!("Tickets:  {}", stats.tickets);
            println!("Users:    {}", stats.users);
            println!("Revenue:  {}", format_price(stats.revenue));
            println!("\x1b[90mRevenue counts only the first page of tickets\x1b[0m");
        }
        AdminData::Tickets(tickets) => {
            for ticket in &tickets {
                let who = ticket.user.as_ref().map(|u| u.username.as_str()).unwrap_or("-");
                let seats: Vec<String> = ticket.seats().iter().map(u32::to_string).collect();
                println!(
                    "#{:<5} {:<16} seats {:<10} {:>10}  {}",
                    ticket.id,
                    who,
                    seats.join(","),
                    format_price(ticket.amount()),
                    ticket_status(ticket)
                );
            }
        }
        AdminData::Users(users) => {
            for user in &users {
                println!("#{:<5} {:<16} {:<28} {}", user.id, user.username, user.email, user.role.label());
            }
        }
        AdminData::Placeholder => println!("{} management is not available yet", tab.title()),
    }
    Ok(())
}
