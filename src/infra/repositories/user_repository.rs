//! User persistence - lookups and atomic field updates.
//!
//! All reads return `Option` rather than erroring on absence; callers
//! translate a miss into the appropriate external error.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::entities::user::{self, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

/// User repository trait for dependency injection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Replace the single active refresh token value for a user.
    /// The previous value is implicitly invalidated.
    async fn update_refresh_token(&self, email: &str, token: &str) -> AppResult<()>;

    /// Mark the user's email address as verified.
    async fn set_email_verified(&self, id: Uuid) -> AppResult<()>;

    /// Store a pending password-reset token on the user.
    async fn set_reset_token(&self, id: Uuid, token: &str) -> AppResult<()>;

    /// Replace the password of the user whose pending reset token matches.
    /// Fails with NotFound when no pending reset matches the token.
    async fn update_password_by_reset_token(&self, token: &str, new_hash: &str) -> AppResult<()>;
}

/// Concrete SeaORM-backed user repository.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find_model_by_email(email).await?.map(User::from))
    }

    async fn update_refresh_token(&self, email: &str, token: &str) -> AppResult<()> {
        let model = self
            .find_model_by_email(email)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = model.into();
        active.refresh_token = Set(Some(token.to_string()));
        active.updated_at = Set(Utc::now());

        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn set_email_verified(&self, id: Uuid) -> AppResult<()> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = model.into();
        active.email_verified = Set(true);
        active.updated_at = Set(Utc::now());

        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token: &str) -> AppResult<()> {
        let model = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = model.into();
        active.reset_token = Set(Some(token.to_string()));
        active.updated_at = Set(Utc::now());

        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn update_password_by_reset_token(&self, token: &str, new_hash: &str) -> AppResult<()> {
        let model = UserEntity::find()
            .filter(user::Column::ResetToken.eq(token))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = Utc::now();
        let mut active: user::ActiveModel = model.into();
        active.password_hash = Set(new_hash.to_string());
        active.reset_token = Set(None);
        active.password_changed_at = Set(Some(now));
        active.updated_at = Set(now);

        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }
}
