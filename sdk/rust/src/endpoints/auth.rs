use crate::client::{ApiClient, ApiResponse};
use crate::error::ApiError;
use crate::models::{
    ForgotPasswordRequest, GoogleLoginRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, UpdateProfileRequest,
};

impl ApiClient {
    pub async fn login(&self, body: &LoginRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Auth/login", body).await
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Auth/register", body).await
    }

    pub async fn forgot_password(&self, body: &ForgotPasswordRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Auth/forgot-password", body).await
    }

    pub async fn reset_password(&self, body: &ResetPasswordRequest) -> Result<ApiResponse, ApiError> {
        self.post_json("/Auth/reset-password", body).await
    }

    pub async fn update_profile(&self, body: &UpdateProfileRequest) -> Result<ApiResponse, ApiError> {
        self.put_json("/Auth/update-profile", body).await
    }

    /// Exchange an OAuth identity credential for a backend token.
    pub async fn google_login(&self, credential: &str) -> Result<ApiResponse, ApiError> {
        let body = GoogleLoginRequest {
            token: credential.to_string(),
        };
        self.post_json("/Auth/google-login", &body).await
    }
}
