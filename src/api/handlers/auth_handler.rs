//! Authentication handlers.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderName, HeaderValue, StatusCode},
    response::{AppendHeaders, Json},
    routing::{patch, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::cookies::{access_token_cookie, refresh_token_cookie};
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::Signup;

/// User signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// User first name
    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "Jane")]
    pub first_name: String,
    /// User last name
    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Doe")]
    pub last_name: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Email verification request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Six-digit verification code from the email
    #[validate(length(equal = 6, message = "Verification code must be 6 digits"))]
    #[schema(example = "482913")]
    pub code: String,
}

/// Resend verification email request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResendVerifyEmailRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// Forgot password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// Password reset request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// Reset token from the forgot-password email
    #[validate(length(min = 1, message = "Reset token is required"))]
    #[schema(example = "482913")]
    pub token: String,
    /// New password (minimum 8 characters)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "NewSecurePass123!", min_length = 8)]
    pub new_password: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/verify-email", post(verify_email))
        .route("/resend-verify-email", post(resend_verify_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", patch(reset_password))
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .registrar
        .signup(Signup {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and receive session cookies
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookies set", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<(
    AppendHeaders<[(HeaderName, HeaderValue); 2]>,
    Json<UserResponse>,
)> {
    let outcome = state
        .credentials
        .login(&payload.email, &payload.password)
        .await?;

    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            refresh_token_cookie(&outcome.refresh_token, state.config.production),
        ),
        (SET_COOKIE, access_token_cookie(&outcome.access_token)),
    ]);

    Ok((cookies, Json(UserResponse::from(outcome.user))))
}

/// Verify an email address with an OTP code
#[utoipa::path(
    post,
    path = "/auth/verify-email",
    tag = "Authentication",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified"),
        (status = 400, description = "Invalid or expired verification code"),
        (status = 404, description = "User not found")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyEmailRequest>,
) -> AppResult<StatusCode> {
    state
        .credentials
        .verify_email(&payload.email, &payload.code)
        .await?;

    Ok(StatusCode::OK)
}

/// Resend the verification email
#[utoipa::path(
    post,
    path = "/auth/resend-verify-email",
    tag = "Authentication",
    request_body = ResendVerifyEmailRequest,
    responses(
        (status = 200, description = "Verification email queued"),
        (status = 404, description = "User not found")
    )
)]
pub async fn resend_verify_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResendVerifyEmailRequest>,
) -> AppResult<StatusCode> {
    state.credentials.resend_verify_email(&payload.email).await?;

    Ok(StatusCode::OK)
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Password reset email queued"),
        (status = 404, description = "User not found")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<StatusCode> {
    state.credentials.forgot_password(&payload.email).await?;

    Ok(StatusCode::OK)
}

/// Reset the password with a reset token
#[utoipa::path(
    patch,
    path = "/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Reset token matches no pending reset")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .credentials
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(StatusCode::OK)
}
