//! Transfer objects exchanged with the cinema API.
//!
//! Everything here is received verbatim from (or sent verbatim to) the
//! server. The client never owns the lifecycle of these entities.

mod lenient;
mod models;
mod time;
mod wire;

pub use models::*;
pub use time::format_timestamp;
pub use wire::*;
