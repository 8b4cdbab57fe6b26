//! Password hashing.
//!
//! New hashes are argon2 PHC strings. Accounts imported from the previous
//! storefront may still carry plain text, bcrypt, bcrypt over a hex SHA-256
//! digest, or Django-style `pbkdf2_sha256$<iterations>$<salt>$<base64>`.
//! Those verify once and are re-hashed by the login flow.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{Output, PasswordHash, PasswordVerifier, SaltString},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use password_hash::rand_core::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFormat {
    Argon2,
    Bcrypt,
    Pbkdf2Sha256,
    PlainText,
}

impl HashFormat {
    pub fn detect(stored: &str) -> Self {
        if stored.starts_with("$argon2") {
            HashFormat::Argon2
        } else if ["$2a$", "$2b$", "$2x$", "$2y$"]
            .iter()
            .any(|prefix| stored.starts_with(prefix))
        {
            HashFormat::Bcrypt
        } else if stored.starts_with("pbkdf2_sha256$") {
            HashFormat::Pbkdf2Sha256
        } else {
            HashFormat::PlainText
        }
    }

    pub fn is_legacy(self) -> bool {
        self != HashFormat::Argon2
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match HashFormat::detect(stored) {
        HashFormat::Argon2 => match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        },
        HashFormat::Bcrypt => {
            bcrypt::verify(password, stored).unwrap_or(false)
                || bcrypt::verify(sha256_hex(password), stored).unwrap_or(false)
        }
        HashFormat::Pbkdf2Sha256 => verify_pbkdf2(password, stored),
        HashFormat::PlainText => {
            !stored.is_empty()
                && digests_match(
                    &Sha256::digest(password.as_bytes()),
                    &Sha256::digest(stored.as_bytes()),
                )
        }
    }
}

/// Constant-time comparison through `Output`, whose `PartialEq` does not
/// short-circuit. Lengths outside what `Output` holds never match.
fn digests_match(a: &[u8], b: &[u8]) -> bool {
    match (Output::new(a), Output::new(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn sha256_hex(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn verify_pbkdf2(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(4, '$');
    let (Some(_), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = STANDARD.decode(expected) else {
        return false;
    };
    if iterations == 0 || expected.is_empty() {
        return false;
    }

    let mut derived = vec![0u8; expected.len()];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut derived);
    digests_match(&derived, &expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn django_hash(password: &str, salt: &str, iterations: u32) -> String {
        let mut out = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
        format!("pbkdf2_sha256${iterations}${salt}${}", STANDARD.encode(out))
    }

    #[test]
    fn argon2_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert_eq!(HashFormat::detect(&hash), HashFormat::Argon2);
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn bcrypt_and_bcrypt_over_sha256() {
        let direct = bcrypt::hash("brakepads", 4).unwrap();
        assert!(verify_password("brakepads", &direct));

        let prehashed = bcrypt::hash(sha256_hex("brakepads"), 4).unwrap();
        assert!(verify_password("brakepads", &prehashed));
        assert!(!verify_password("rotors", &prehashed));
        assert!(HashFormat::detect(&prehashed).is_legacy());
    }

    #[test]
    fn pbkdf2_django_format() {
        let stored = django_hash("oilfilter", "abc123", 1_000);
        assert_eq!(HashFormat::detect(&stored), HashFormat::Pbkdf2Sha256);
        assert!(verify_password("oilfilter", &stored));
        assert!(!verify_password("airfilter", &stored));
        assert!(!verify_password("oilfilter", "pbkdf2_sha256$x$abc$AAAA"));
    }

    #[test]
    fn digest_comparison_needs_equal_bytes_and_length() {
        let a = Sha256::digest(b"spark plug");
        let b = Sha256::digest(b"spark plugs");
        assert!(digests_match(&a, &a));
        assert!(!digests_match(&a, &b));
        assert!(!digests_match(&a[..16], &a));
        assert!(!digests_match(&[1, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn plain_text_requires_exact_match() {
        assert!(verify_password("hunter2", "hunter2"));
        assert!(!verify_password("hunter", "hunter2"));
        assert!(!verify_password("", ""));
    }
}
