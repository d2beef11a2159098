//! Rendering of the catalog screen and its overlays

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use shared::format_timestamp;

use crate::admin::{AdminPanel, AdminTab};
use crate::booking::{BookingDraft, Occupancy};
use crate::catalog::{format_price, MovieCard, SessionCard};
use crate::login::{Field, FormMode, LoginForm};
use crate::profile::{ticket_status, ProfileView};
use crate::shell::{Overlay, Phase};

use super::app::{App, Focus};

/// Draw the UI
pub fn draw(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let shell = &app.shell;

    let mut constraints = vec![Constraint::Length(3)];
    if shell.error.is_some() {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Length(1));

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut slot = 0;
    draw_header(app, frame, layout[slot]);
    slot += 1;

    if let Some(error) = &shell.error {
        let banner = Paragraph::new(format!("⚠ {}  (Esc to dismiss)", error))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Red)))
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, layout[slot]);
        slot += 1;
    }

    let main = layout[slot];
    if shell.phase == Phase::Loading {
        let loading = Paragraph::new("Loading…")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(loading, main);
    } else {
        draw_catalog(app, frame, main);
    }

    if let Some(toast) = &shell.toast {
        let line = Paragraph::new(format!(" {}", toast.message))
            .style(Style::default().fg(Color::Black).bg(Color::Green));
        frame.render_widget(line, layout[slot + 1]);
    }

    draw_status_bar(app, frame, layout[slot + 2]);

    match shell.modals.top() {
        Some(Overlay::Login) => draw_login(&shell.login, frame, area),
        Some(Overlay::Booking) => {
            if let Some(draft) = &shell.booking {
                draw_booking(draft, frame, area);
            }
        }
        Some(Overlay::Admin) => draw_admin(&shell.admin, frame, area),
        Some(Overlay::Profile) => draw_profile(&shell.profile, frame, area),
        None => {}
    }
}

fn draw_header(app: &App, frame: &mut Frame, area: Rect) {
    let user = match &app.shell.user {
        Some(user) => Span::styled(
            format!("{} ({})", user.display_name(), user.role.label()),
            Style::default().fg(Color::Green),
        ),
        None => Span::styled("Not logged in", Style::default().fg(Color::DarkGray)),
    };
    let line = Line::from(vec![
        Span::styled("🎬 Cinema Paradise", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        user,
        Span::styled(format!("   {}", app.server()), Style::default().fg(Color::DarkGray)),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn draw_catalog(app: &App, frame: &mut Frame, area: Rect) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let movies: Vec<ListItem> = app
        .shell
        .movies
        .iter()
        .map(MovieCard::from)
        .map(|card| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(card.title, Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    Span::styled(card.rating, Style::default().fg(Color::Yellow)),
                ]),
                Line::styled(
                    format!("  {} · {}", card.genre, card.duration),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    let movies_list = List::new(movies)
        .block(
            Block::default()
                .title(" Movies ")
                .borders(Borders::ALL)
                .border_style(focus_style(app.focus == Focus::Movies)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if app.focus == Focus::Movies && !app.shell.movies.is_empty() {
        state.select(Some(app.movie_idx));
    }
    frame.render_stateful_widget(movies_list, panes[0], &mut state);

    let sessions: Vec<ListItem> = app
        .shell
        .visible_sessions()
        .iter()
        .map(SessionCard::from)
        .map(|card| {
            let action = if card.bookable {
                Span::styled(format!("[{}]", card.action_label()), Style::default().fg(Color::Green))
            } else {
                Span::styled(format!("[{}]", card.action_label()), Style::default().fg(Color::DarkGray))
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw("  "),
                    action,
                ]),
                Line::styled(
                    format!("  {} · {} · {} · {}", card.starts, card.hall, card.price, card.seats_text()),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    let empty = sessions.is_empty();
    let sessions_list = List::new(sessions)
        .block(
            Block::default()
                .title(" Upcoming sessions ")
                .borders(Borders::ALL)
                .border_style(focus_style(app.focus == Focus::Sessions)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if app.focus == Focus::Sessions && !empty {
        state.select(Some(app.session_idx));
    }
    frame.render_stateful_widget(sessions_list, panes[1], &mut state);
}

fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = match app.shell.modals.top() {
        Some(Overlay::Login) => " Tab: Next field | Enter: Submit | Ctrl+T: Login/Register | Esc: Cancel ",
        Some(Overlay::Booking) => " Arrows: Move | Space: Select seat | c: Clear | Enter: Book | Esc: Cancel ",
        Some(Overlay::Admin) => " ←/→: Switch tab | r: Reload | Esc: Close ",
        Some(Overlay::Profile) => " r: Reload | Esc: Close ",
        None if app.shell.user.is_some() => {
            " Tab: Switch list | ↑/↓: Move | Enter: Book | l: Logout | p: Profile | a: Admin | r: Refresh | q: Quit "
        }
        None => " Tab: Switch list | ↑/↓: Move | Enter: Book | l: Login | r: Refresh | q: Quit ",
    };
    let paragraph = Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Overlays
// ============================================================================

/// Rectangle centered in `area`, sized as a percentage of it
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn overlay_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
}

fn error_line(error: &Option<String>) -> Option<Line<'static>> {
    error
        .as_ref()
        .map(|e| Line::styled(format!("✗ {}", e), Style::default().fg(Color::Red)))
}

fn draw_login(form: &LoginForm, frame: &mut Frame, area: Rect) {
    let rect = centered_rect(50, 50, area);
    frame.render_widget(Clear, rect);

    let title = match form.mode {
        FormMode::Login => " Login ",
        FormMode::Register => " Register ",
    };

    let mut lines = Vec::new();
    for field in form.fields() {
        let value = match field {
            Field::Password => "*".repeat(form.password.chars().count()),
            other => form.value(*other).to_string(),
        };
        let focused = *field == form.focused();
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let cursor = if focused { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>11}: ", field.label()), style),
            Span::raw(format!("{}{}", value, cursor)),
        ]));
    }
    lines.push(Line::raw(""));
    if form.submitting {
        lines.push(Line::styled("Please wait…", Style::default().fg(Color::DarkGray)));
    }
    lines.extend(error_line(&form.error));

    let paragraph = Paragraph::new(lines)
        .block(overlay_block(title.to_string()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, rect);
}

fn draw_booking(draft: &BookingDraft, frame: &mut Frame, area: Rect) {
    let rect = centered_rect(80, 80, area);
    frame.render_widget(Clear, rect);

    let show = &draft.showtime;
    let title = format!(
        " {} · {} · {} ",
        show.title(),
        show.hall_name(),
        format_timestamp(&show.start_time)
    );

    let mut lines = vec![Line::styled("SCREEN", Style::default().fg(Color::DarkGray)), Line::raw("")];

    if draft.map().is_empty() {
        lines.push(Line::raw("Seating plan is not available for this session."));
    }
    let cursor = draft.current_seat().map(|s| s.number);
    for row in draft.map().rows() {
        let mut spans = Vec::with_capacity(row.len() + 1);
        if let Some(first) = row.first() {
            spans.push(Span::styled(format!("R{:<3}", first.row), Style::default().fg(Color::DarkGray)));
        }
        for seat in row {
            let mut style = if seat.booked {
                Style::default().fg(Color::DarkGray)
            } else if draft.selection.contains(seat.number) {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };
            if cursor == Some(seat.number) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let label = if seat.booked {
                "  ×".to_string()
            } else {
                format!("{:>3}", seat.number)
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::raw(""));
    match &draft.occupancy {
        Occupancy::Loading => lines.push(Line::styled(
            "Checking taken seats…",
            Style::default().fg(Color::DarkGray),
        )),
        Occupancy::Known => {}
        Occupancy::Unavailable(_) => lines.push(Line::styled(
            "Taken seats unknown; the server will reject a seat that is already sold.",
            Style::default().fg(Color::Yellow),
        )),
    }

    let seats: Vec<String> = draft.selection.seat_numbers().iter().map(u32::to_string).collect();
    lines.push(Line::from(vec![
        Span::raw("Selected: "),
        Span::styled(
            if seats.is_empty() { "none".to_string() } else { seats.join(", ") },
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("   Total: {}", format_price(draft.total_price()))),
    ]));
    if draft.submitting {
        lines.push(Line::styled("Booking…", Style::default().fg(Color::DarkGray)));
    }
    lines.extend(error_line(&draft.error));

    let paragraph = Paragraph::new(lines).block(overlay_block(title));
    frame.render_widget(paragraph, rect);
}

fn draw_profile(view: &ProfileView, frame: &mut Frame, area: Rect) {
    let rect = centered_rect(80, 80, area);
    frame.render_widget(Clear, rect);

    let mut lines = Vec::new();
    if let Some(user) = &view.user {
        lines.push(Line::styled(user.display_name(), Style::default().add_modifier(Modifier::BOLD)));
        lines.push(Line::raw(format!("{} · {}", user.email, user.role.label())));
        if let Some(since) = &user.created_at {
            lines.push(Line::raw(format!("Member since {}", format_timestamp(since))));
        }
        lines.push(Line::raw(""));
    }

    lines.push(Line::styled("My tickets", Style::default().fg(Color::Cyan)));
    if view.loading {
        lines.push(Line::raw("Loading…"));
    } else if view.tickets.is_empty() && view.error.is_none() {
        lines.push(Line::styled("No tickets yet.", Style::default().fg(Color::DarkGray)));
    }
    for ticket in &view.tickets {
        let title = ticket.session.as_ref().map(|s| s.title()).unwrap_or("Movie");
        let starts = ticket
            .session
            .as_ref()
            .map(|s| format_timestamp(&s.start_time))
            .unwrap_or_default();
        let seats: Vec<String> = ticket.seats().iter().map(u32::to_string).collect();
        lines.push(Line::from(vec![
            Span::styled(format!("#{:<5}", ticket.id), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:<24}", title), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{:<18} seats {:<10} {:>10}  ", starts, seats.join(","), format_price(ticket.amount()))),
            Span::styled(ticket_status(ticket), Style::default().fg(Color::Green)),
        ]));
    }
    lines.extend(error_line(&view.error));

    let paragraph = Paragraph::new(lines)
        .block(overlay_block(" My account ".to_string()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, rect);
}

fn draw_admin(panel: &AdminPanel, frame: &mut Frame, area: Rect) {
    let rect = centered_rect(85, 85, area);
    frame.render_widget(Clear, rect);

    let block = overlay_block(" Admin dashboard ".to_string());
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    let selected = AdminTab::ALL.iter().position(|t| *t == panel.tab).unwrap_or(0);
    let tabs = Tabs::new(AdminTab::ALL.iter().map(|t| t.title()))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, layout[0]);

    let mut lines = Vec::new();
    if panel.loading {
        lines.push(Line::raw("Loading…"));
    } else {
        match panel.tab {
            AdminTab::Stats => {
                if let Some(stats) = &panel.stats {
                    lines.push(Line::raw(format!("Movies:          {}", stats.movies)));
                    lines.push(Line::raw(format!(
                        "Sessions:        {} ({} active)",
                        stats.sessions, stats.active_sessions
                    )));
                    lines.push(Line::raw(format!("Tickets:         {}", stats.tickets)));
                    lines.push(Line::raw(format!("Users:           {}", stats.users)));
                    lines.push(Line::raw(format!("Revenue:         {}", format_price(stats.revenue))));
                    lines.push(Line::raw(""));
                    lines.push(Line::styled(
                        "Revenue counts only the first page of tickets.",
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            AdminTab::Tickets => {
                for ticket in &panel.tickets {
                    let who = ticket.user.as_ref().map(|u| u.username.clone()).unwrap_or_default();
                    let seats: Vec<String> = ticket.seats().iter().map(u32::to_string).collect();
                    lines.push(Line::raw(format!(
                        "#{:<5} {:<16} {:<24} seats {:<10} {:>10}  {}",
                        ticket.id,
                        who,
                        ticket.session.as_ref().map(|s| s.title()).unwrap_or("Movie"),
                        seats.join(","),
                        format_price(ticket.amount()),
                        ticket_status(ticket)
                    )));
                }
            }
            AdminTab::Users => {
                for user in &panel.users {
                    lines.push(Line::raw(format!(
                        "#{:<5} {:<16} {:<28} {}",
                        user.id,
                        user.username,
                        user.email,
                        user.role.label()
                    )));
                }
            }
            AdminTab::Movies | AdminTab::Sessions => {
                lines.push(Line::styled(
                    format!("{} management is not available yet.", panel.tab.title()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }
    lines.extend(error_line(&panel.error));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), layout[1]);
}
