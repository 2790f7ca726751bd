//! Booking artifacts: QR codes, invoice PDF, email bodies, CSV export
//!
//! Everything here is a pure derivation from a booking (plus the owner's
//! profile). Only the embedded generation timestamp varies between calls.

pub mod email;
pub mod export;
pub mod invoice;
pub mod qr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

pub use email::{confirmation_email, reminder_email};
pub use export::bookings_csv;
pub use invoice::{render_invoice_pdf, Invoice};
pub use qr::{booking_id_qr, booking_qr, QrEnvelope, QrImage};

/// `$46.18` for USD, `46.18 EUR` for anything else.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let amount = crate::domain::booking::round_money(amount);
    if currency.eq_ignore_ascii_case("USD") {
        format!("${:.2}", amount)
    } else {
        format!("{:.2} {}", amount, currency)
    }
}

/// `Tuesday, September 16, 2025`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// `02:30 PM`
pub fn format_clock(at: NaiveDateTime) -> String {
    at.format("%I:%M %p").to_string()
}
