//! Login check against the `[users]` config section.
//!
//! Each entry maps a username to an argon2 PHC hash string
//! (`guest = $argon2id$v=19$...`). Usernames are case-insensitive because
//! config keys are.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::domain::error::TradeBuddyError;
use crate::ports::config_port::ConfigPort;

pub const USERS_SECTION: &str = "users";

/// Verify `password` for `username`. Returns the normalized user id on success.
///
/// Unknown users, unparsable hashes and wrong passwords all yield
/// `TradeBuddyError::AuthFailed` so callers cannot tell them apart.
pub fn authenticate(
    credentials: &dyn ConfigPort,
    username: &str,
    password: &str,
) -> Result<String, TradeBuddyError> {
    let user = username.trim().to_lowercase();
    let failed = || TradeBuddyError::AuthFailed { user: user.clone() };

    if user.is_empty() {
        return Err(failed());
    }

    let stored = credentials
        .get_string(USERS_SECTION, &user)
        .ok_or_else(failed)?;
    let parsed = PasswordHash::new(stored.trim()).map_err(|_| failed())?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| failed())?;

    Ok(user)
}

/// Produce an argon2id hash suitable for a `[users]` entry.
pub fn hash_password(password: &str) -> Result<String, TradeBuddyError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TradeBuddyError::PasswordHash {
            reason: e.to_string(),
        })
}
