//! Admin-only operations: contact inbox, users and roles, booking review.

use serde_json::json;
use std::fmt::Display;

use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::RoleAssignment;

impl ApiClient {
    pub async fn get_messages(&self) -> Result<ApiResponse, ApiError> {
        self.get("/Admin/messages").await
    }

    pub async fn get_message(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/Admin/messages/{}", id)).await
    }

    pub async fn mark_message_read(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.put_empty(&format!("/Admin/messages/{}/mark-read", id)).await
    }

    pub async fn delete_message(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/Admin/messages/{}", id)).await
    }

    pub async fn get_users(&self) -> Result<ApiResponse, ApiError> {
        self.get("/Admin/users").await
    }

    pub async fn get_user(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.get(&format!("/Admin/users/{}", id)).await
    }

    pub async fn assign_role(&self, id: impl Display, body: &RoleAssignment) -> Result<ApiResponse, ApiError> {
        self.post_json(&format!("/Admin/users/{}/assign-role", id), body)
            .await
    }

    pub async fn remove_role(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.post_json(&format!("/Admin/users/{}/remove-role", id), &json!({}))
            .await
    }

    pub async fn get_admin_bookings(&self) -> Result<ApiResponse, ApiError> {
        self.get("/Admin/bookings").await
    }

    pub async fn approve_booking(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.put_empty(&format!("/Admin/bookings/{}/approve", id)).await
    }

    pub async fn reject_booking(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/Admin/bookings/{}/reject", id)).await
    }

    pub async fn complete_booking(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.put_empty(&format!("/Admin/bookings/{}/complete", id)).await
    }
}
