use axum::{extract::State, http::StatusCode, response::Json, Extension};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::dtos::auth_dtos::{DataResponse, LoginRequest, RegisterRequest, UserData};
use crate::errors::{AppError, Result};
use crate::extract::ValidatedJson;
use crate::models::user::{AuthResponse, Claims, Role, User, UserResponse};
use crate::services::otp_service::normalize_identifier;
use crate::services::password::{hash_blocking, verify_blocking};
use crate::services::token::issue_token;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<DataResponse<UserData>>)> {
    let min = state.password_reset.policy().min_password_length;
    if payload.password.chars().count() < min {
        return Err(AppError::WeakPassword(min));
    }

    let email = normalize_identifier(&payload.email);
    if state.accounts.find_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateKey);
    }

    let password_hash = hash_blocking(state.hasher.clone(), payload.password).await?;
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    let now = Utc::now();
    let user = state
        .accounts
        .insert(User {
            _id: None,
            name,
            email,
            password_hash,
            role: Role::User,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let token = issue_token(&state.jwt_secret, &user)?;
    tracing::info!("new account registered: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            success: true,
            message: "Registration successful".to_string(),
            data: UserData {
                user: UserResponse::from(&user),
                token: Some(token),
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = normalize_identifier(&payload.email);
    let user = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or(AppError::AuthError)?;

    let valid = verify_blocking(
        state.hasher.clone(),
        payload.password,
        user.password_hash.clone(),
    )
    .await?;

    if !valid {
        tracing::debug!("failed login for {}", email);
        return Err(AppError::AuthError);
    }

    let token = issue_token(&state.jwt_secret, &user)?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DataResponse<UserData>>> {
    let id = ObjectId::parse_str(&claims.sub)?;
    let user = state
        .accounts
        .find_by_id(&id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(DataResponse {
        success: true,
        message: "Current user".to_string(),
        data: UserData {
            user: UserResponse::from(&user),
            token: None,
        },
    }))
}
