//! HS256 JWT verifier for access tokens minted by the identity service.
//!
//! Tokens carry the user id in `sub` and an optional `role` claim. Anything
//! other than `admin` is treated as a regular user.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

use crate::domain::ports::{AccessTokenError, AccessTokenVerifier};
use crate::domain::{User, UserId, UserRole};

/// Validation parameters for access tokens.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Shared HMAC secret.
    pub secret: String,
    /// Expected `iss` claim, when the issuer sets one.
    pub issuer: Option<String>,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_seconds: u64,
}

#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    #[serde(default)]
    role: Option<String>,
}

/// [`AccessTokenVerifier`] backed by `jsonwebtoken`.
pub struct JwtAccessTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAccessTokenVerifier {
    /// Build a verifier from settings.
    #[must_use]
    pub fn new(settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_seconds;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
        }
    }
}

impl AccessTokenVerifier for JwtAccessTokenVerifier {
    fn verify(&self, token: &str) -> Result<User, AccessTokenError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|err| {
            debug!(error = %err, "access token rejected");
            match err.kind() {
                ErrorKind::ExpiredSignature => AccessTokenError::expired(),
                _ => AccessTokenError::invalid(err.to_string()),
            }
        })?;
        let id = UserId::new(&data.claims.sub)
            .map_err(|err| AccessTokenError::invalid(format!("sub claim: {err}")))?;
        let role = data
            .claims
            .role
            .as_deref()
            .map_or(UserRole::User, UserRole::from_column);
        Ok(User { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use rstest::{fixture, rstest};
    use serde_json::json;

    const SECRET: &str = "fleet-test-secret";
    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[fixture]
    fn verifier() -> JwtAccessTokenVerifier {
        JwtAccessTokenVerifier::new(&JwtSettings {
            secret: SECRET.into(),
            issuer: Some("fleet-identity".into()),
            leeway_seconds: 0,
        })
    }

    fn token(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode token")
    }

    fn exp(offset_seconds: i64) -> i64 {
        chrono::Utc::now().timestamp() + offset_seconds
    }

    #[rstest]
    fn admin_role_is_read_from_claims(verifier: JwtAccessTokenVerifier) {
        let claims = json!({"sub": USER, "role": "admin", "iss": "fleet-identity", "exp": exp(600)});
        let user = verifier.verify(&token(&claims, SECRET)).expect("valid token");
        assert_eq!(user.id.as_ref(), USER);
        assert!(user.is_admin());
    }

    #[rstest]
    fn missing_role_defaults_to_user(verifier: JwtAccessTokenVerifier) {
        let claims = json!({"sub": USER, "iss": "fleet-identity", "exp": exp(600)});
        let user = verifier.verify(&token(&claims, SECRET)).expect("valid token");
        assert_eq!(user.role, UserRole::User);
    }

    #[rstest]
    fn expired_tokens_are_distinguished(verifier: JwtAccessTokenVerifier) {
        let claims = json!({"sub": USER, "iss": "fleet-identity", "exp": exp(-600)});
        let error = verifier.verify(&token(&claims, SECRET)).expect_err("expired");
        assert_eq!(error, AccessTokenError::expired());
    }

    #[rstest]
    #[case::wrong_secret(json!({"sub": USER, "iss": "fleet-identity", "exp": exp(600)}), "other")]
    #[case::wrong_issuer(json!({"sub": USER, "iss": "someone-else", "exp": exp(600)}), SECRET)]
    #[case::bad_subject(json!({"sub": "not-a-uuid", "iss": "fleet-identity", "exp": exp(600)}), SECRET)]
    fn other_failures_are_invalid(
        verifier: JwtAccessTokenVerifier,
        #[case] claims: serde_json::Value,
        #[case] secret: &str,
    ) {
        let error = verifier.verify(&token(&claims, secret)).expect_err("invalid");
        assert!(matches!(error, AccessTokenError::Invalid { .. }));
    }
}
