//! HTML and plaintext email bodies

use crate::application::ports::EmailMessage;
use crate::domain::booking::Booking;
use crate::domain::notification::ReminderOffset;

use super::{format_clock, format_long_date, format_money};

const BASE_STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.content { background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }
.booking-details { background: white; padding: 20px; border-radius: 8px; margin: 20px 0; }
.detail-row { display: flex; justify-content: space-between; padding: 10px 0; border-bottom: 1px solid #eee; }
.label { font-weight: bold; color: #666; }
.footer { text-align: center; margin-top: 30px; color: #666; font-size: 12px; }";

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn history_link(app_base_url: &str) -> String {
    format!("{}/booking-history", app_base_url.trim_end_matches('/'))
}

fn detail_rows(rows: &[(&str, String)]) -> String {
    rows.iter()
        .map(|(label, value)| {
            format!(
                "<div class=\"detail-row\"><span class=\"label\">{}:</span><span class=\"value\">{}</span></div>",
                label,
                escape_html(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn page(accent: &str, title: &str, lead: &str, rows: &str, link: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html>
<head>
<meta charset=\"utf-8\">
<style>
{style}
.header {{ background: {accent}; color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}
.button {{ display: inline-block; padding: 12px 30px; background: {accent}; color: white; text-decoration: none; border-radius: 5px; margin-top: 20px; }}
</style>
</head>
<body>
<div class=\"container\">
<div class=\"header\"><h1>{title}</h1><p>{lead}</p></div>
<div class=\"content\">
<div class=\"booking-details\">
<h2>Booking Details</h2>
{rows}
</div>
<a href=\"{link}\" class=\"button\">View Booking</a>
<div class=\"footer\"><p>Thank you for using TakeCharge!</p><p>If you have any questions, please contact our support team.</p></div>
</div>
</div>
</body>
</html>",
        style = BASE_STYLE,
        accent = accent,
        title = title,
        lead = lead,
        rows = rows,
        link = escape_html(link),
    )
}

fn time_range(booking: &Booking) -> String {
    format!(
        "{} - {}",
        format_clock(booking.schedule.start_time),
        format_clock(booking.schedule.end_time)
    )
}

/// Sent once checkout succeeds.
pub fn confirmation_email(
    booking: &Booking,
    to: &str,
    app_base_url: &str,
    currency: &str,
) -> EmailMessage {
    let rows = [
        ("Booking ID", booking.id.clone()),
        ("Station", booking.station.name.clone()),
        ("Address", booking.station.address.clone()),
        ("Date", format_long_date(booking.schedule.date)),
        ("Time", time_range(booking)),
        (
            "Duration",
            format!("{} minutes", booking.schedule.duration.total_minutes()),
        ),
        ("Total Cost", format_money(booking.total(), currency)),
    ];
    let link = history_link(app_base_url);

    let html = page(
        "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
        "⚡ Booking Confirmed!",
        "Your EV charging session has been booked successfully",
        &detail_rows(&rows),
        &link,
    );

    let mut text = String::from("Booking Confirmed!\n\n");
    for (label, value) in &rows {
        text.push_str(&format!("{}: {}\n", label, value));
    }
    text.push_str(&format!("\nView your booking: {}\n", link));

    EmailMessage {
        to: to.to_string(),
        subject: format!("Booking Confirmed - {}", booking.station.name),
        html,
        text,
    }
}

/// Sent `offset` ahead of the session start.
pub fn reminder_email(
    booking: &Booking,
    offset: ReminderOffset,
    to: &str,
    app_base_url: &str,
) -> EmailMessage {
    let when = format!(
        "{} at {}",
        format_long_date(booking.schedule.date),
        format_clock(booking.schedule.start_time)
    );
    let rows = [
        ("Station", booking.station.name.clone()),
        ("Date & Time", when),
        ("Address", booking.station.address.clone()),
    ];
    let link = history_link(app_base_url);
    let lead = format!("Your booking starts in {}", offset.label());

    let html = page(
        "#f59e0b",
        "⏰ Reminder: Charging Session",
        &lead,
        &detail_rows(&rows),
        &link,
    );

    let mut text = format!("{}\n\n", lead);
    for (label, value) in &rows {
        text.push_str(&format!("{}: {}\n", label, value));
    }
    text.push_str(&format!("\nView your booking: {}\n", link));

    EmailMessage {
        to: to.to_string(),
        subject: format!("Reminder: Your charging session starts in {}", offset.label()),
        html,
        text,
    }
}
