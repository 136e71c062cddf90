//! Key derivation: PBKDF2-HMAC-SHA256 master password → wrapping key

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use lockit_core::{CryptoError, CryptoResult};

use crate::{KEY_SIZE, MIN_SALT_SIZE};

/// A 256-bit AES key derived from a secret via PBKDF2.
///
/// Never persisted anywhere; recomputed from the secret on every unlock.
/// Zeroized on drop so it does not linger in memory.
#[derive(Clone)]
pub struct WrappingKey {
    bytes: [u8; KEY_SIZE],
}

impl WrappingKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for WrappingKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for WrappingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappingKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the vault-key wrapping key from a secret and salt.
///
/// Deterministic: the same (secret, salt, iterations) triple always yields
/// the same key, which is what makes unlock possible at all. The iteration
/// count must be the one stored in the envelope being unwrapped.
pub fn derive_wrapping_key(
    secret: &SecretString,
    salt: &[u8],
    iterations: u32,
) -> CryptoResult<WrappingKey> {
    validate_kdf_inputs(secret, salt, iterations)?;

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(secret.expose_secret().as_bytes(), salt, iterations, &mut key);
    Ok(WrappingKey::from_bytes(key))
}

/// Derive the server-side authentication verifier.
///
/// Runs one further PBKDF2 pass over the wrapping key with the secret as
/// salt, so the hash handed to the server never equals the wrapping key for
/// the same (secret, salt, iterations) inputs.
pub fn derive_auth_hash(
    secret: &SecretString,
    salt: &[u8],
    iterations: u32,
) -> CryptoResult<[u8; KEY_SIZE]> {
    let wrapping = derive_wrapping_key(secret, salt, iterations)?;

    let mut hash = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        wrapping.as_bytes(),
        secret.expose_secret().as_bytes(),
        1,
        &mut hash,
    );
    Ok(hash)
}

fn validate_kdf_inputs(secret: &SecretString, salt: &[u8], iterations: u32) -> CryptoResult<()> {
    if secret.expose_secret().is_empty() {
        return Err(CryptoError::KeyDerivation("empty secret".into()));
    }
    if salt.len() < MIN_SALT_SIZE {
        return Err(CryptoError::KeyDerivation(format!(
            "salt too short: {} bytes (minimum {MIN_SALT_SIZE})",
            salt.len()
        )));
    }
    if iterations == 0 {
        return Err(CryptoError::KeyDerivation("zero iteration count".into()));
    }
    Ok(())
}
