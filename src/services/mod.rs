//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.

mod authenticator;
mod credentials;
mod otp;
mod registrar;
mod token_codec;

pub use authenticator::{AuthOutcome, RequestAuthenticator};
pub use credentials::{CredentialFlows, CredentialService, LoginOutcome};
pub use otp::{OtpGateway, RedisOtpGateway};
pub use registrar::{AccountRegistrar, Signup, SignupRegistrar};
pub use token_codec::{Claims, TokenCodec, TokenError};
