use reqwest::Method;
use std::fmt::Display;

use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::{ReviewRequest, RoomForm, RoomSearch};

impl ApiClient {
    pub async fn get_rooms(&self) -> Result<ApiResponse, ApiError> {
        self.get("/Rooms").await
    }

    pub async fn get_room(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/Rooms/{}", id)).await
    }

    pub async fn search_rooms(&self, params: &RoomSearch) -> Result<ApiResponse, ApiError> {
        self.get_with_query("/Rooms/search", params).await
    }

    /// Sent as `multipart/form-data`.
    pub async fn create_room(&self, form: RoomForm) -> Result<ApiResponse, ApiError> {
        self.send_multipart(Method::POST, "/Rooms", form.into_form()?)
            .await
    }

    /// Sent as `multipart/form-data`.
    pub async fn update_room(&self, id: impl Display, form: RoomForm) -> Result<ApiResponse, ApiError> {
        self.send_multipart(Method::PUT, &format!("/Rooms/{}", id), form.into_form()?)
            .await
    }

    pub async fn delete_room(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/Rooms/{}", id)).await
    }

    pub async fn add_review(&self, body: &ReviewRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Reviews", body).await
    }

    pub async fn get_reviews(&self, room_id: impl Display) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/Reviews/{}", room_id)).await
    }
}
