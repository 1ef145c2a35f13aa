use std::num::NonZeroU32;

use password_hash::{Ident, Output, ParamsString, PasswordHash, SaltString};
use ring::{
    digest, pbkdf2,
    rand::{SecureRandom, SystemRandom},
};

use crate::error::AppError;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS_PARAM: &str = "i";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Salted PBKDF2 password hashing.
///
/// Hashes are PHC strings (`$pbkdf2-sha256$i=<iterations>$<salt>$<hash>`), so
/// the iteration count can be raised without invalidating existing passwords.
#[derive(Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl PasswordHasher {
    pub fn new(iterations: NonZeroU32) -> Self {
        Self {
            iterations,
            rng: SystemRandom::new(),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| AppError::internal("Failed to generate password salt"))?;

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        let encode_failed = |e: password_hash::Error| {
            AppError::internal(format!("Failed to encode password hash: {e}"))
        };
        let salt = SaltString::encode_b64(&salt).map_err(encode_failed)?;
        let mut params = ParamsString::new();
        params
            .add_decimal(ITERATIONS_PARAM, self.iterations.get())
            .map_err(encode_failed)?;

        let phc = PasswordHash {
            algorithm: Ident::new(SCHEME).map_err(encode_failed)?,
            version: None,
            params,
            salt: Some(salt.as_salt()),
            hash: Some(Output::new(&hash).map_err(encode_failed)?),
        };
        Ok(phc.to_string())
    }

    /// Constant-time comparison of `password` against a stored hash.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AppError> {
        let parsed = StoredHash::parse(stored)
            .ok_or_else(|| AppError::internal("Stored password hash is malformed"))?;

        Ok(pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            parsed.iterations,
            &parsed.salt,
            password.as_bytes(),
            &parsed.hash,
        )
        .is_ok())
    }
}

struct StoredHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl StoredHash {
    fn parse(stored: &str) -> Option<Self> {
        let phc = PasswordHash::new(stored).ok()?;
        if phc.algorithm.as_str() != SCHEME {
            return None;
        }
        let iterations = NonZeroU32::new(phc.params.get_decimal(ITERATIONS_PARAM)?)?;
        let mut salt_buf = [0u8; 64];
        let salt = phc.salt?.decode_b64(&mut salt_buf).ok()?.to_vec();
        let hash = phc.hash?.as_bytes().to_vec();
        if hash.len() != HASH_LEN {
            return None;
        }

        Some(Self {
            iterations,
            salt,
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(NonZeroU32::new(1_000).unwrap())
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let stored = hasher.hash("secret").unwrap();

        assert!(stored.starts_with("$pbkdf2-sha256$i=1000$"));
        assert!(PasswordHash::new(&stored).is_ok());
        assert!(!stored.contains("secret"));
        assert!(hasher.verify("secret", &stored).unwrap());
        assert!(!hasher.verify("Secret", &stored).unwrap());
        assert!(!hasher.verify("", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let hasher = hasher();
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret", &first).unwrap());
        assert!(hasher.verify("secret", &second).unwrap());
    }

    #[test]
    fn verifies_with_the_stored_iteration_count() {
        let old = PasswordHasher::new(NonZeroU32::new(500).unwrap());
        let stored = old.hash("secret").unwrap();

        assert!(hasher().verify("secret", &stored).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        let hasher = hasher();
        for stored in [
            "",
            "plaintext",
            "pbkdf2-sha256$1000$AAAA$AAAA",
            "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$YWJjZGVmZ2hpamtsbW5vcA",
            "$pbkdf2-sha256$i=0$c29tZXNhbHRzb21lc2FsdA$YWJjZGVmZ2hpamtsbW5vcHFyc3R1dnd4eXphYmNkZWY",
        ] {
            let err = hasher.verify("secret", stored).unwrap_err();
            assert!(matches!(err, AppError::Internal(_)), "{stored}");
        }
    }
}
