use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

/// Well-formed argon2id hash with the default cost parameters. No password
/// verifies against it.
const FALLBACK_DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$9ap931EX+LLPImbNwterPQ$jMmuL8BbwiKjo2USo7ofm9enp4n749V7CgUlva0hKQE";

lazy_static! {
    // Verified against when the email is unknown so both login failures cost the same.
    static ref DUMMY_HASH: String = match hash_password("cineswipe-unknown-account") {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "dummy hash could not be generated, using fallback");
            FALLBACK_DUMMY_HASH.to_string()
        }
    };
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Burns one verification so an unknown email takes as long as a wrong password.
pub fn verify_against_dummy(plain: &str) {
    let _ = verify_password(plain, &DUMMY_HASH);
}
