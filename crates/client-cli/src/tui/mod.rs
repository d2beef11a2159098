//! Terminal UI for browsing the catalog and booking seats
//!
//! Provides a full-screen interface with:
//! - Catalog: movies on the left, upcoming sessions on the right
//! - Overlays: login/registration, seat picker, profile, admin dashboard
//! - A status bar with key hints, an error banner and a toast line

mod app;
mod views;

pub use app::App;
