//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, user_handler};
use crate::config::ACCESS_TOKEN_COOKIE;
use crate::domain::UserResponse;

/// OpenAPI documentation for ReadStack
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ReadStack API",
        version = "0.1.0",
        description = "Cookie-based authentication service with rotating access/refresh tokens",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::signup,
        auth_handler::login,
        auth_handler::verify_email,
        auth_handler::resend_verify_email,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        // User endpoints
        user_handler::get_current_user,
    ),
    components(
        schemas(
            UserResponse,
            auth_handler::SignupRequest,
            auth_handler::LoginRequest,
            auth_handler::VerifyEmailRequest,
            auth_handler::ResendVerifyEmailRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Signup, login, and credential recovery"),
        (name = "Users", description = "Authenticated user operations")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for cookie session authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    ACCESS_TOKEN_COOKIE,
                    "Access token cookie set by /auth/login",
                ))),
            );
        }
    }
}
