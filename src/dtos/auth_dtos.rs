use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::UserResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[serde(alias = "identifier")]
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOTPRequest {
    #[serde(alias = "identifier")]
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[serde(alias = "code")]
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(alias = "identifier")]
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[serde(alias = "new_password", alias = "newSecret")]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, alias = "username")]
    pub name: Option<String>,

    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOTPResponse {
    pub success: bool,
    pub message: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}
