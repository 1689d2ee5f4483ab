use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::ContactMessage;

impl ApiClient {
    /// Public contact form.
    pub async fn send_message(&self, body: &ContactMessage) -> Result<ApiResponse, ApiError> {
        self.post_json("/Contact/send-message", body).await
    }
}
