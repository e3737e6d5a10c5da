use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _,
    PasswordVerifier, Version,
};

use crate::errors::InternalError;

/// Argon2id hashing with a server-side pepper supplied as the secret
/// parameter. The pepper never appears in the stored hash, so a database dump
/// alone is not enough to attack the hashes offline.
pub struct PasswordService {
    pepper: String,
}

impl PasswordService {
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.pepper.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| InternalError::Crypto(format!("argon2 init: {}", e)))
    }

    pub fn hash(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| InternalError::Crypto(format!("hash: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Constant-time verification. A malformed stored hash verifies as false
    /// rather than surfacing an error to the caller.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, InternalError> {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(h) => h,
            Err(_) => return Ok(false),
        };
        Ok(self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

impl std::fmt::Debug for PasswordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordService")
            .field("pepper", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let service = PasswordService::new("test-pepper".to_string());
        let hash = service.hash("hunter2").unwrap();
        assert!(service.verify("hunter2", &hash).unwrap());
        assert!(!service.verify("hunter3", &hash).unwrap());
    }

    #[test]
    fn different_pepper_fails_verification() {
        let a = PasswordService::new("pepper-a".to_string());
        let b = PasswordService::new("pepper-b".to_string());
        let hash = a.hash("hunter2").unwrap();
        assert!(!b.verify("hunter2", &hash).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_just_false() {
        let service = PasswordService::new("test-pepper".to_string());
        assert!(!service.verify("hunter2", "not-a-phc-string").unwrap());
    }
}
