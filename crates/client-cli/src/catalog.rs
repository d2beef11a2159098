//! Display models for the movie and session lists.

use shared::{format_timestamp, Movie, Showtime};

pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0} ₽", price)
    } else {
        format!("{:.2} ₽", price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub duration: String,
    pub rating: String,
    pub description: String,
}

impl From<&Movie> for MovieCard {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            genre: genre_label(&movie.genre),
            duration: movie
                .duration
                .map(|m| format!("{} min", m))
                .unwrap_or_else(|| "—".to_string()),
            rating: movie
                .rating
                .map(|r| format!("★ {:.1}", r))
                .unwrap_or_default(),
            description: movie.description.clone().unwrap_or_default(),
        }
    }
}

/// "sci_fi" -> "Sci-Fi"
fn genre_label(genre: &str) -> String {
    genre
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionCard {
    pub id: i64,
    pub title: String,
    pub hall: String,
    pub price: String,
    pub starts: String,
    pub available_seats: u32,
    pub total_seats: u32,
    /// Whether the book action is enabled
    pub bookable: bool,
}

impl From<&Showtime> for SessionCard {
    fn from(showtime: &Showtime) -> Self {
        Self {
            id: showtime.id,
            title: showtime.title().to_string(),
            hall: showtime.hall_name().to_string(),
            price: format_price(showtime.price),
            starts: format_timestamp(&showtime.start_time),
            available_seats: showtime.available_seats,
            total_seats: showtime.capacity(),
            bookable: showtime.available_seats > 0,
        }
    }
}

impl SessionCard {
    pub fn action_label(&self) -> &'static str {
        if self.bookable {
            "Book"
        } else {
            "Sold out"
        }
    }

    pub fn seats_text(&self) -> String {
        format!("{} free of {}", self.available_seats, self.total_seats)
    }

    /// Activating a disabled card does nothing
    pub fn activate<'a>(&self, showtime: &'a Showtime) -> Option<&'a Showtime> {
        self.bookable.then_some(showtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn showtime(available: serde_json::Value) -> Showtime {
        serde_json::from_value(json!({
            "id": 3,
            "price": 450.5,
            "start_time": "2024-06-01T20:00:00",
            "available_seats": available,
            "movie": {"id": 1, "title": "Arrival", "genre": "drama"},
            "hall": {"name": "Blue", "capacity": 80}
        }))
        .unwrap()
    }

    #[test]
    fn test_sold_out_session_is_disabled() {
        let show = showtime(json!(0));
        let card = SessionCard::from(&show);
        assert!(!card.bookable);
        assert_eq!(card.action_label(), "Sold out");
        assert!(card.activate(&show).is_none());
    }

    #[test]
    fn test_available_session_is_bookable() {
        let show = showtime(json!("12"));
        let card = SessionCard::from(&show);
        assert!(card.bookable);
        assert_eq!(card.action_label(), "Book");
        assert_eq!(card.activate(&show).map(|s| s.id), Some(3));
        assert_eq!(card.seats_text(), "12 free of 80");
        assert_eq!(card.title, "Arrival");
        assert_eq!(card.hall, "Blue");
        assert_eq!(card.price, "450.50 ₽");
        assert_eq!(card.starts, "01 Jun 2024 20:00");
    }

    #[test]
    fn test_movie_card_fields() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 1, "title": "Dune", "genre": "sci_fi", "duration": 155, "rating": 8.14
        }))
        .unwrap();
        let card = MovieCard::from(&movie);
        assert_eq!(card.genre, "Sci-Fi");
        assert_eq!(card.duration, "155 min");
        assert_eq!(card.rating, "★ 8.1");
        assert_eq!(card.description, "");
    }

    #[test]
    fn test_price_format() {
        assert_eq!(format_price(350.0), "350 ₽");
        assert_eq!(format_price(99.9), "99.90 ₽");
    }
}
