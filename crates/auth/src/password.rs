use thiserror::Error;

/// Default bcrypt work factor; matches the salt rounds used by the original
/// deployment so existing hashes remain verifiable.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Error)]
#[error("password hashing failed")]
pub struct HashError(#[source] bcrypt::BcryptError);

/// One-way salted password hashing with bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Hasher with an explicit work factor. Tests use a low cost; production
    /// code should rely on [`Default`].
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        bcrypt::hash(password, self.cost).map_err(HashError)
    }

    /// Constant-shape verification: hash comparison failure and bcrypt
    /// errors both read as "no match".
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        // Minimum bcrypt cost keeps the test suite fast.
        PasswordHasher::new(4)
    }

    #[test]
    fn hash_then_verify_round_trip() {
        let hasher = hasher();
        let hash = hasher.hash("password1").unwrap();

        assert_ne!(hash, "password1");
        assert!(hasher.verify("password1", &hash));
        assert!(!hasher.verify("password2", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("password1").unwrap();
        let second = hasher.hash("password1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!hasher().verify("password1", "not-a-bcrypt-hash"));
    }
}
