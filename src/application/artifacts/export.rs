//! CSV export of a booking list

use csv::Writer;

use crate::domain::booking::{round_money, Booking};
use crate::domain::payment::payment_method_label;
use crate::shared::errors::InfraError;

pub const CSV_HEADER: [&str; 9] = [
    "Booking ID",
    "Station Name",
    "Location",
    "Date",
    "Start Time",
    "Duration (mins)",
    "Status",
    "Total Cost",
    "Payment Method",
];

/// Rows appear in the order given; callers filter and sort first.
pub fn bookings_csv(bookings: &[Booking]) -> Result<String, InfraError> {
    let render = |e: csv::Error| InfraError::Render(format!("csv export failed: {}", e));

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(render)?;
    for booking in bookings {
        writer
            .write_record([
                booking.id.clone(),
                booking.station.name.clone(),
                booking.station.address.clone(),
                booking.schedule.date.format("%Y-%m-%d").to_string(),
                booking.schedule.start_time.format("%H:%M").to_string(),
                booking.schedule.duration.total_minutes().to_string(),
                booking.status.to_string(),
                format!("{:.2}", round_money(booking.total())),
                payment_method_label(&booking.payment_method),
            ])
            .map_err(render)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| InfraError::Render(format!("csv export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| InfraError::Render(e.to_string()))
}
