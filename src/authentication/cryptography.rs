use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use rand::Rng;

use crate::constants::ACCESS_TOKEN_BYTES;

/// Argon2id with the crate's default parameters, used for both hashing and checking.
fn hasher() -> Argon2<'static> {
    Argon2::default()
}

/// PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher().hash_password(password.as_bytes(), &salt)?;

    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch. A stored hash that cannot be parsed is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(stored_hash)?;

    match hasher().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Opaque key handed out by the token endpoint, lower-case hex.
pub fn generate_access_token() -> String {
    let bytes: [u8; ACCESS_TOKEN_BYTES] = rand::thread_rng().gen();

    hex::encode(bytes)
}
