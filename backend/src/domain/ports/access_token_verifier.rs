//! Port for validating bearer access tokens.

use crate::domain::User;

use super::define_port_error;

define_port_error! {
    /// Reasons a token is refused.
    pub enum AccessTokenError {
        /// The token was well formed but is past its expiry.
        Expired =>
            "access token expired",
        /// The token failed signature or claim validation.
        Invalid { message: String } =>
            "access token invalid: {message}",
    }
}

/// Verify a bearer token and resolve the caller.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokenVerifier: Send + Sync {
    /// Decode and validate `token`.
    fn verify(&self, token: &str) -> Result<User, AccessTokenError>;
}
