//! QR payloads rendered as SVG data URLs

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::booking::Booking;
use crate::shared::errors::InfraError;

const QR_SIZE_PX: u32 = 256;

/// JSON envelope scanned at the charger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrEnvelope {
    pub booking_id: String,
    pub user_id: String,
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl QrEnvelope {
    pub fn for_booking(booking: &Booking, at: DateTime<Utc>) -> Self {
        Self {
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            station_id: booking.station.id.clone(),
            timestamp: at,
            kind: "booking".to_string(),
        }
    }
}

/// Encoded payload and its rendered image
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrImage {
    pub payload: String,
    /// `data:image/svg+xml;base64,...`
    pub data_url: String,
}

/// Encode `payload` with error correction level H.
pub fn encode(payload: &str) -> Result<QrCode, InfraError> {
    QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| InfraError::Render(format!("qr encode failed: {}", e)))
}

pub fn to_data_url(code: &QrCode) -> String {
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_SIZE_PX, QR_SIZE_PX)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(image))
}

/// Full booking QR (JSON envelope)
pub fn booking_qr(booking: &Booking, at: DateTime<Utc>) -> Result<QrImage, InfraError> {
    let payload = serde_json::to_string(&QrEnvelope::for_booking(booking, at))?;
    let code = encode(&payload)?;
    Ok(QrImage {
        data_url: to_data_url(&code),
        payload,
    })
}

/// Bare booking-id QR, printed on invoices
pub fn booking_id_qr(booking_id: &str) -> Result<QrImage, InfraError> {
    let code = encode(booking_id)?;
    Ok(QrImage {
        data_url: to_data_url(&code),
        payload: booking_id.to_string(),
    })
}
