//! Booking invoice rendered to PDF
//!
//! [`Invoice`] holds the text content and is what the tests inspect;
//! [`render_invoice_pdf`] lays it out on one A4 page with a booking-id QR.

use chrono::{NaiveDate, NaiveTime};
use printpdf::lopdf::{self, Object, StringFormat};
use printpdf::{
    BuiltinFont, Color, CustomPdfConformance, IndirectFontRef, Line, Mm, OffsetDateTime,
    PdfConformance, PdfDocument, PdfLayerReference, Point, Rect, Rgb,
};
use qrcode::Color as Module;

use super::{format_clock, format_long_date, format_money, qr};
use crate::domain::booking::Booking;
use crate::domain::payment::payment_method_label;
use crate::domain::user::UserProfile;
use crate::shared::errors::InfraError;

pub const COMPANY_NAME: &str = "TakeCharge";
pub const COMPANY_TAGLINE: &str = "EV Charging Network";
pub const SUPPORT_EMAIL: &str = "support@takecharge.com";

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const VALUE_COL: f32 = MARGIN + 40.0;
const QR_SIDE_MM: f32 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub number: String,
    pub issued_on: NaiveDate,
    pub bill_to_name: String,
    pub bill_to_email: Option<String>,
    /// Label/value rows of the booking section
    pub details: Vec<(String, String)>,
    /// Label/amount rows of the pricing section
    pub pricing: Vec<(String, String)>,
    pub total: String,
    pub payment_method: String,
    pub status: String,
    pub booking_id: String,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Invoice {
    pub fn for_booking(
        booking: &Booking,
        owner: Option<&UserProfile>,
        currency: &str,
        issued_on: NaiveDate,
    ) -> Self {
        let schedule = &booking.schedule;
        let mut details = vec![
            ("Booking ID".to_string(), booking.id.clone()),
            ("Station".to_string(), booking.station.name.clone()),
            ("Address".to_string(), booking.station.address.clone()),
            ("Date".to_string(), format_long_date(schedule.date)),
            (
                "Time".to_string(),
                format!(
                    "{} - {}",
                    format_clock(schedule.start_time),
                    format_clock(schedule.end_time)
                ),
            ),
            (
                "Duration".to_string(),
                format!("{} minutes", schedule.duration.total_minutes()),
            ),
            ("Connector".to_string(), booking.slot.connector_type.clone()),
            (
                "Charging Speed".to_string(),
                format!("{} kW", booking.slot.power_kw.normalize()),
            ),
        ];
        if let Some(done) = &booking.completion {
            details.push((
                "Energy Delivered".to_string(),
                format!("{} kWh", done.energy_delivered_kwh.normalize()),
            ));
        }

        let price = &booking.pricing;
        let mut pricing = vec![
            (
                "Rate per kWh".to_string(),
                format!("{:.4}", price.rate),
            ),
            ("Charging Cost".to_string(), format_money(price.energy_cost, currency)),
        ];
        if price.platform_fee > rust_decimal::Decimal::ZERO {
            pricing.push(("Platform Fee".to_string(), format_money(price.platform_fee, currency)));
        }
        if price.taxes > rust_decimal::Decimal::ZERO {
            pricing.push(("Taxes".to_string(), format_money(price.taxes, currency)));
        }
        let modification_fees = price.modification_fees();
        if modification_fees != rust_decimal::Decimal::ZERO {
            pricing.push((
                "Modification Fee".to_string(),
                format_money(modification_fees, currency),
            ));
        }

        Self {
            number: format!("INV-{}", booking.id),
            issued_on,
            bill_to_name: owner
                .map(UserProfile::display_name)
                .unwrap_or_else(|| "Customer".to_string()),
            bill_to_email: owner.and_then(|u| u.email.clone()),
            details,
            pricing,
            total: format_money(booking.total(), currency),
            payment_method: payment_method_label(&booking.payment_method),
            status: capitalize(booking.status.as_str()),
            booking_id: booking.id.clone(),
        }
    }
}

struct Pen {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    /// Distance from the top edge, in mm
    y: f32,
}

impl Pen {
    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(PAGE_H - self.y), font);
    }

    /// Rough right alignment for Helvetica
    fn text_right(&self, text: &str, size: f32, font: &IndirectFontRef) {
        let width_mm = text.chars().count() as f32 * size * 0.5 * 0.3528;
        self.text(text, size, PAGE_W - MARGIN - width_mm, font);
    }

    fn rule(&mut self) {
        let y = Mm(PAGE_H - self.y);
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), y), false),
                (Point::new(Mm(PAGE_W - MARGIN), y), false),
            ],
            is_closed: false,
        });
        self.y += 5.0;
    }

    fn row(&mut self, label: &str, value: &str) {
        self.text(&format!("{}:", label), 10.0, MARGIN, &self.bold.clone());
        self.text(value, 10.0, VALUE_COL, &self.regular.clone());
        self.y += 6.0;
    }

    fn amount_row(&mut self, label: &str, amount: &str) {
        self.text(&format!("{}:", label), 10.0, MARGIN, &self.regular.clone());
        self.text_right(amount, 10.0, &self.regular.clone());
        self.y += 6.0;
    }

    /// Draw `code` as filled squares with its top-left corner at (x, self.y)
    fn qr(&self, code: &qrcode::QrCode, x: f32, side: f32) {
        let width = code.width();
        let cell = side / width as f32;
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        for (idx, module) in code.to_colors().into_iter().enumerate() {
            if module != Module::Dark {
                continue;
            }
            let col = (idx % width) as f32;
            let row = (idx / width) as f32;
            let left = x + col * cell;
            let top = self.y + row * cell;
            self.layer.add_rect(Rect::new(
                Mm(left),
                Mm(PAGE_H - top - cell),
                Mm(left + cell),
                Mm(PAGE_H - top),
            ));
        }
    }
}

fn pdf_err(e: printpdf::Error) -> InfraError {
    InfraError::Render(format!("pdf render failed: {}", e))
}

fn lopdf_err(e: lopdf::Error) -> InfraError {
    InfraError::Render(format!("pdf rewrite failed: {}", e))
}

/// Midnight UTC of the issue date, used for every document date
fn issued_at(invoice: &Invoice) -> Result<OffsetDateTime, InfraError> {
    let timestamp = invoice.issued_on.and_time(NaiveTime::MIN).and_utc().timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| InfraError::Render(format!("invoice date out of range: {}", e)))
}

/// Replace the random trailer `/ID` pair with the invoice number.
fn stamp_document_id(bytes: &[u8], invoice: &Invoice) -> Result<Vec<u8>, InfraError> {
    let mut doc = lopdf::Document::load_mem(bytes).map_err(lopdf_err)?;
    let id = || Object::String(invoice.number.as_bytes().to_vec(), StringFormat::Literal);
    doc.trailer.set("ID", Object::Array(vec![id(), id()]));
    let mut out = Vec::with_capacity(bytes.len());
    doc.save_to(&mut out).map_err(|e| lopdf_err(e.into()))?;
    Ok(out)
}

/// Render the invoice to PDF bytes. The same invoice always yields the same bytes.
pub fn render_invoice_pdf(invoice: &Invoice) -> Result<Vec<u8>, InfraError> {
    let issued_at = issued_at(invoice)?;
    let (doc, page, layer) =
        PdfDocument::new(invoice.number.as_str(), Mm(PAGE_W), Mm(PAGE_H), "Invoice");
    let doc = doc
        .with_document_id(invoice.number.clone())
        .with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_xmp_metadata: false,
            ..CustomPdfConformance::default()
        }))
        .with_creation_date(issued_at)
        .with_mod_date(issued_at)
        .with_metadata_date(issued_at);
    let mut pen = Pen {
        layer: doc.get_page(page).get_layer(layer),
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?,
        y: MARGIN,
    };
    let (regular, bold, italic) = (pen.regular.clone(), pen.bold.clone(), pen.italic.clone());

    // company header
    pen.text(COMPANY_NAME, 20.0, MARGIN, &bold);
    pen.y += 8.0;
    pen.text(COMPANY_TAGLINE, 10.0, MARGIN, &regular);
    pen.y += 5.0;
    pen.text(&format!("Email: {}", SUPPORT_EMAIL), 10.0, MARGIN, &regular);
    pen.y += 10.0;

    pen.text_right("INVOICE", 16.0, &bold);
    pen.y += 8.0;
    pen.text_right(&format!("Invoice #: {}", invoice.number), 10.0, &regular);
    pen.y += 5.0;
    pen.text_right(
        &format!("Date: {}", invoice.issued_on.format("%B %-d, %Y")),
        10.0,
        &regular,
    );
    pen.y += 10.0;
    pen.rule();

    pen.text("Bill To:", 12.0, MARGIN, &bold);
    pen.y += 7.0;
    pen.text(&invoice.bill_to_name, 10.0, MARGIN, &regular);
    pen.y += 5.0;
    if let Some(email) = &invoice.bill_to_email {
        pen.text(email, 10.0, MARGIN, &regular);
        pen.y += 5.0;
    }
    pen.y += 5.0;
    pen.rule();
    pen.y += 5.0;

    pen.text("Booking Details", 12.0, MARGIN, &bold);
    pen.y += 8.0;
    for (label, value) in &invoice.details {
        pen.row(label, value);
    }
    pen.y += 5.0;
    pen.rule();
    pen.y += 5.0;

    pen.text("Pricing Breakdown", 12.0, MARGIN, &bold);
    pen.y += 8.0;
    for (label, amount) in &invoice.pricing {
        pen.amount_row(label, amount);
    }
    pen.y += 2.0;
    pen.rule();
    pen.y += 5.0;

    pen.text("Total Amount:", 12.0, MARGIN, &bold);
    pen.text_right(&invoice.total, 12.0, &bold);
    pen.y += 8.0;
    pen.rule();
    pen.y += 5.0;

    pen.text(&format!("Payment Method: {}", invoice.payment_method), 10.0, MARGIN, &regular);
    pen.y += 6.0;
    pen.text(&format!("Status: {}", invoice.status), 10.0, MARGIN, &regular);
    pen.y += 10.0;

    if pen.y < PAGE_H - 60.0 {
        let code = qr::encode(&invoice.booking_id)?;
        let x = PAGE_W - MARGIN - QR_SIDE_MM;
        pen.qr(&code, x, QR_SIDE_MM);
        pen.y += QR_SIDE_MM + 5.0;
        pen.text("Scan for booking details", 8.0, x, &regular);
    }

    pen.y = PAGE_H - 20.0;
    pen.layer
        .set_fill_color(Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None)));
    pen.text("Thank you for using TakeCharge!", 8.0, 78.0, &italic);
    pen.y += 5.0;
    pen.text(
        "This is an automated invoice generated by TakeCharge EV Charging Network.",
        8.0,
        45.0,
        &italic,
    );

    let bytes = doc.save_to_bytes().map_err(pdf_err)?;
    stamp_document_id(&bytes, invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::model::fixtures;
    use crate::domain::booking::Completion;
    use rust_decimal_macros::dec;

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    #[test]
    fn invoice_number_and_bill_to() {
        let booking = fixtures::booking("b-9", "user-1");
        let mut owner = UserProfile::new("user-1");
        owner.email = Some("ravi@example.com".into());

        let invoice = Invoice::for_booking(&booking, Some(&owner), "USD", issued());
        assert_eq!(invoice.number, "INV-b-9");
        assert_eq!(invoice.bill_to_name, "ravi");
        assert_eq!(invoice.bill_to_email.as_deref(), Some("ravi@example.com"));
        assert_eq!(invoice.total, "$22.68");
        assert_eq!(invoice.payment_method, "Credit Card");
        assert_eq!(invoice.status, "Confirmed");
    }

    #[test]
    fn anonymous_owner_is_customer() {
        let booking = fixtures::booking("b-9", "user-1");
        let invoice = Invoice::for_booking(&booking, None, "USD", issued());
        assert_eq!(invoice.bill_to_name, "Customer");
        assert!(invoice.bill_to_email.is_none());
    }

    #[test]
    fn pricing_rows() {
        let booking = fixtures::booking("b-9", "user-1");
        let invoice = Invoice::for_booking(&booking, None, "USD", issued());
        let labels: Vec<_> = invoice.pricing.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Rate per kWh", "Charging Cost", "Platform Fee", "Taxes"]);
        assert_eq!(invoice.pricing[1].1, "$20.00");
    }

    #[test]
    fn rescheduled_booking_lists_modification_fee() {
        let mut booking = fixtures::booking("b-9", "user-1");
        let schedule = booking.schedule;
        booking
            .modify(schedule, dec!(2.50), fixtures::now())
            .unwrap();
        let invoice = Invoice::for_booking(&booking, None, "USD", issued());
        assert_eq!(
            invoice.pricing.last(),
            Some(&("Modification Fee".to_string(), "$2.50".to_string()))
        );
        assert_eq!(invoice.total, "$25.18");
    }

    #[test]
    fn completed_booking_lists_energy() {
        let mut booking = fixtures::booking("b-9", "user-1");
        booking.completion = Some(Completion {
            actual_duration_minutes: 85,
            energy_delivered_kwh: dec!(54.2),
            actual_cost: None,
        });
        let invoice = Invoice::for_booking(&booking, None, "USD", issued());
        assert!(invoice
            .details
            .iter()
            .any(|(l, v)| l == "Energy Delivered" && v == "54.2 kWh"));
    }

    #[test]
    fn renders_a_pdf() {
        let booking = fixtures::booking("b-9", "user-1");
        let invoice = Invoice::for_booking(&booking, None, "USD", issued());
        let bytes = render_invoice_pdf(&invoice).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn same_invoice_renders_identical_bytes() {
        let booking = fixtures::booking("b-9", "user-1");
        let invoice = Invoice::for_booking(&booking, None, "USD", issued());
        let first = render_invoice_pdf(&invoice).unwrap();
        let second = render_invoice_pdf(&invoice).unwrap();
        assert_eq!(first, second);

        let doc = lopdf::Document::load_mem(&first).unwrap();
        let id = doc.trailer.get(b"ID").unwrap().as_array().unwrap();
        assert_eq!(id[0].as_str().unwrap(), b"INV-b-9");
    }
}
