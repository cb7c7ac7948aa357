//! Application state - Dependency injection container.
//!
//! Explicit handles for every collaborator; nothing is an ambient
//! singleton.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{
    Cache, Database, NotificationQueue, Persistence, UserRepository, UserStore,
};
use crate::services::{
    AccountRegistrar, CredentialFlows, CredentialService, RedisOtpGateway, RequestAuthenticator,
    SignupRegistrar, TokenCodec,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Per-request authenticator
    pub authenticator: Arc<RequestAuthenticator>,
    /// Signup pipeline
    pub registrar: Arc<dyn AccountRegistrar>,
    /// Login / verification / password-reset flows
    pub credentials: Arc<dyn CredentialFlows>,
    /// User lookups for protected handlers
    pub users: Arc<dyn UserRepository>,
    /// Redis cache (rate limiting, health)
    pub cache: Arc<Cache>,
    /// Database connection (health)
    pub database: Arc<Database>,
    /// Application configuration (cookie attributes)
    pub config: Config,
}

impl AppState {
    /// Wire the full service graph from infrastructure handles and config.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<Cache>,
        queue: Arc<dyn NotificationQueue>,
        config: Config,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(&config));
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new(database.get_connection()));
        let otp = Arc::new(RedisOtpGateway::new(cache.clone()));
        let uow = Arc::new(Persistence::new(database.get_connection()));

        let authenticator = Arc::new(RequestAuthenticator::new(codec.clone(), users.clone()));
        let registrar = Arc::new(SignupRegistrar::new(uow, otp.clone(), queue.clone()));
        let credentials = Arc::new(CredentialService::new(
            users.clone(),
            codec,
            otp,
            queue,
        ));

        Self {
            authenticator,
            registrar,
            credentials,
            users,
            cache,
            database,
            config,
        }
    }
}
