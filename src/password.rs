use crate::domain;
use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Production password scheme: Argon2id in PHC string format, with the salt and
/// parameters embedded in the stored verifier.
pub struct Argon2Passwords {}

impl domain::auth::driven_ports::PasswordScheme for Argon2Passwords {
    fn derive_verifier(&self, password: &str) -> Result<String, anyhow::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let verifier = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow!("deriving password verifier: {err}"))?;

        Ok(verifier.to_string())
    }

    fn verify(&self, password: &str, stored_verifier: &str) -> Result<bool, anyhow::Error> {
        let parsed_verifier = PasswordHash::new(stored_verifier)
            .map_err(|err| anyhow!("stored verifier failed to parse: {err}"))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_verifier) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(anyhow!("password verification failed: {err}")),
        }
    }
}
