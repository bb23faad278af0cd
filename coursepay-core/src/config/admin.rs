//! Admin configuration.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The argon2 hashed admin secret.
    pub secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Verify a plaintext secret against the stored hash.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    #[test]
    fn verify_secret_matches_only_the_original() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"operator-secret", &salt)
            .unwrap()
            .to_string();

        let admin = AdminConfig::new(hash);
        assert!(admin.verify_secret("operator-secret"));
        assert!(!admin.verify_secret("wrong-secret"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let admin = AdminConfig::new("not-a-hash".to_string());
        assert!(!admin.verify_secret("anything"));
    }
}
