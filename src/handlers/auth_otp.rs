use axum::{extract::State, response::Json};

use crate::dtos::auth_dtos::{
    ForgotPasswordRequest, ForgotPasswordResponse, ResetPasswordRequest, ResetPasswordResponse,
    VerifyOTPRequest, VerifyOTPResponse,
};
use crate::errors::Result;
use crate::extract::ValidatedJson;
use crate::services::otp_service::normalize_identifier;
use crate::state::AppState;

// 1. Forgot Password - Request OTP
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>> {
    state.password_reset.request_challenge(&req.email).await?;

    // Same answer whether or not the account exists.
    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: "If an account exists for this email, a reset code has been sent".to_string(),
        email: normalize_identifier(&req.email),
    }))
}

// 2. Verify OTP
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyOTPRequest>,
) -> Result<Json<VerifyOTPResponse>> {
    state.password_reset.verify_challenge(&req.email, &req.otp).await?;

    Ok(Json(VerifyOTPResponse {
        success: true,
        message: "OTP verified successfully".to_string(),
        email: normalize_identifier(&req.email),
    }))
}

// 3. Reset Password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>> {
    state
        .password_reset
        .commit_new_password(&req.email, &req.new_password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password reset successful".to_string(),
    }))
}
