//! Booking module: availability, slot holds and the staff review flow.
//!
//! The persistent store is the single source of truth for hold and
//! booking existence; no in-process cache of availability is ever
//! authoritative.

pub mod availability;
pub mod events;
pub mod holds;
pub mod models;
pub mod queries;
pub mod requests;
pub mod review;
pub mod routes;

// Re-export commonly used items
pub use availability::check_availability;
pub use events::{BookingEvent, Notifier, TracingNotifier};
pub use holds::{create_hold, promote_hold, release_hold, start_hold_sweeper};
pub use models::{Booking, BookingWindow, Hold, RequestStatus, ReservationRequest};
pub use review::{transition_request, ReviewAction};
pub use routes::router;
