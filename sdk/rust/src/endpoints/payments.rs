use std::fmt::Display;

use super::encode_segment;
use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::BookingRef;

impl ApiClient {
    pub async fn create_payment_intent(&self, booking_id: impl Display) -> Result<ApiResponse, ApiError> {
        let body = BookingRef {
            booking_id: booking_id.to_string(),
        };
        self.post_json("/Payment/create-payment-intent", &body).await
    }

    pub async fn confirm_payment(&self, booking_id: impl Display) -> Result<ApiResponse, ApiError> {
        let body = BookingRef {
            booking_id: booking_id.to_string(),
        };
        self.post_json("/Payment/confirm-payment", &body).await
    }

    pub async fn check_payment_status(&self, payment_intent_id: &str) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/Payment/status/{}", encode_segment(payment_intent_id)))
            .await
    }

    /// Alias of [`ApiClient::check_payment_status`].
    pub async fn get_payment_status(&self, payment_intent_id: &str) -> Result<ApiResponse, ApiError> {
        self.check_payment_status(payment_intent_id).await
    }
}
