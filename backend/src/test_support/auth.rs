//! Token verifier backed by a fixed table.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::User;
use crate::domain::ports::{AccessTokenError, AccessTokenVerifier};

/// Maps literal bearer tokens to users. The token `expired` is always
/// reported as expired.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier(Mutex<HashMap<String, User>>);

impl StaticTokenVerifier {
    /// Accept `token` as `user`.
    pub fn grant(&self, token: impl Into<String>, user: User) {
        self.table().insert(token.into(), user);
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, User>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("token table mutex"),
        }
    }
}

impl AccessTokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<User, AccessTokenError> {
        if token == "expired" {
            return Err(AccessTokenError::expired());
        }
        self.table()
            .get(token)
            .cloned()
            .ok_or_else(|| AccessTokenError::invalid("unknown token"))
    }
}
