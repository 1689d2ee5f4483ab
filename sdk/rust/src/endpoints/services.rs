use std::fmt::Display;

use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::ServiceRequest;

impl ApiClient {
    pub async fn get_services(&self) -> Result<ApiResponse, ApiError> {
        self.get("/Services").await
    }

    pub async fn create_service(&self, body: &ServiceRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Services", body).await
    }

    pub async fn delete_service(&self, id: impl Display) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/Services/{}", id)).await
    }
}
