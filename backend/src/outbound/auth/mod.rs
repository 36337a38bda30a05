//! Access token verification adapters.

mod jwt_access_token_verifier;

pub use jwt_access_token_verifier::{JwtAccessTokenVerifier, JwtSettings};
