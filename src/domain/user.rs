//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User domain entity.
///
/// `refresh_token` holds the single active refresh token value for this
/// account. Writing a new value implicitly invalidates the previous one;
/// no token history is kept. Users are never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email_verified: bool,
    pub suspended: bool,
    /// Set whenever the password changes (reset flow); reserved for
    /// token-issued-before-password-change invalidation.
    pub password_changed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    /// Pending password-reset token, cleared on successful reset.
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unverified user
    pub fn new(
        id: Uuid,
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            first_name,
            last_name,
            email_verified: false,
            suspended: false,
            password_changed_at: None,
            refresh_token: None,
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields required to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User first name
    #[schema(example = "John")]
    pub first_name: String,
    /// User last name
    #[schema(example = "Doe")]
    pub last_name: String,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}
