//! Request payloads sent to the booking API.
//!
//! Field names follow the backend's JSON contract. Responses are left as
//! `serde_json::Value`; callers deserialize what they need through
//! [`crate::ApiResponse::json`].

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Serialize, Serializer};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Room search filters. Unset filters are left out of the query string.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSearch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Comma-separated service ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
}

impl RoomSearch {
    pub fn is_empty(&self) -> bool {
        self.room_type.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.from.is_none()
            && self.to.is_none()
            && self.services.is_none()
    }
}

/// An image attached to a room form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Multipart payload for room create and update.
#[derive(Debug, Clone, Default)]
pub struct RoomForm {
    pub number: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub image: Option<ImageUpload>,
    pub service_ids: Vec<String>,
}

impl RoomForm {
    /// Encode as multipart fields `Number`, `Type`, `PricePerNight`,
    /// `Image` and one `ServiceIds` field per service.
    pub fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("Number", self.number.trim().to_string())
            .text("Type", self.room_type.trim().to_string())
            .text("PricePerNight", self.price_per_night.to_string());

        if let Some(image) = self.image {
            let mut part = Part::bytes(image.bytes).file_name(image.file_name);
            if let Some(content_type) = image.content_type {
                part = part
                    .mime_str(&content_type)
                    .map_err(|e| ApiError::Request(format!("invalid image type: {}", e)))?;
            }
            form = form.part("Image", part);
        }

        for id in self.service_ids {
            form = form.text("ServiceIds", id);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub room_id: String,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub room_id: String,
    #[serde(serialize_with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(serialize_with = "iso_millis")]
    pub end_date: DateTime<Utc>,
}

// Same shape as `Date.prototype.toISOString`: millisecond precision, `Z`.
fn iso_millis<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookingRef {
    pub booking_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactMessage {
    pub username: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleAssignment {
    pub role: String,
}

impl RoleAssignment {
    pub fn admin() -> Self {
        Self {
            role: "Admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRequest {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct GoogleLoginRequest {
    pub token: String,
}
