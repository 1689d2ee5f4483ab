use std::fmt::Display;

use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::BookingRequest;

impl ApiClient {
    pub async fn create_booking(&self, body: &BookingRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Bookings", body).await
    }

    /// Bookings of the signed-in user.
    pub async fn my_bookings(&self) -> Result<ApiResponse, ApiError> {
        self.get("/Bookings/my-bookings").await
    }

    pub async fn get_booking(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/Bookings/{}", id)).await
    }

    pub async fn cancel_booking(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.put_empty(&format!("/Bookings/{}/cancel", id)).await
    }
}
