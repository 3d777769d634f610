use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};

/// Argon2 hashing with a fresh salt per password.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    pub fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// A stored hash that fails to parse verifies as false rather than
    /// erroring, so callers treat it like any wrong password.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_matching_password_only() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("secret123").unwrap();

        assert!(hasher.verify("secret123", &hash));
        assert!(!hasher.verify("secret124", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let hasher = PasswordHasher::new();
        let first = hasher.hash("secret123").unwrap();
        let second = hasher.hash("secret123").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret123", &second));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("secret123", "not-a-phc-string"));
    }
}
