//! Filter/sort engine
//!
//! Pure functions over already-fetched lists. Inputs are never mutated;
//! every call returns a new, ordered view. Predicates are AND-combined and
//! sorts are stable, so equal keys keep their input order.

pub mod booking;
pub mod station;

pub use booking::{filter_bookings, BookingFilter, BookingPredicate, BookingSort, DateWindow};
pub use station::{filter_stations, StationFilter, StationPredicate, StationSort};

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// `Some(trimmed lowercase)` for a non-blank search term
fn search_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}
