//! Vault key wrapping: the vault key at rest, encrypted under a
//! password-derived key
//!
//! The same vault key may be wrapped more than once (master password wrap
//! and recovery wrap), each time under its own salt; every wrap carries the
//! salt and iteration count needed to reverse it. Unwrap failure is reported
//! as a single generic [`CryptoError::Unwrap`] — wrong password and
//! corrupted storage are deliberately indistinguishable.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use secrecy::SecretString;
use zeroize::Zeroize;

use lockit_core::{CryptoError, CryptoResult, KeyEnvelope};

use crate::codec::{normalize, to_base64};
use crate::kdf::derive_wrapping_key;
use crate::{IV_SIZE, KEY_SIZE, SALT_SIZE, TAG_SIZE};

/// The one symmetric key that encrypts a user's vault records.
///
/// Generated once at signup and never regenerated; password changes re-wrap
/// it, they do not replace it. Exists in plaintext only in volatile memory.
/// Zeroized on drop.
#[derive(Clone)]
pub struct VaultKey {
    bytes: [u8; KEY_SIZE],
}

impl VaultKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for VaultKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit vault key.
pub fn generate_vault_key() -> VaultKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    VaultKey::from_bytes(bytes)
}

/// Generate a fresh random KDF salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Wrap (encrypt) the vault key under a key derived from `secret`.
///
/// Generates a fresh random 96-bit IV on every call, retries included — IV
/// reuse under one key breaks GCM confidentiality outright. Ciphertext and
/// the 128-bit tag are stored split, base64-encoded, together with the salt
/// and iteration count used.
pub fn wrap(
    secret: &SecretString,
    vault_key: &VaultKey,
    salt: &[u8; SALT_SIZE],
    iterations: u32,
) -> CryptoResult<KeyEnvelope> {
    let wrapping = derive_wrapping_key(secret, salt, iterations)?;
    let cipher = Aes256Gcm::new(wrapping.as_bytes().into());

    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&iv), vault_key.as_bytes().as_ref())
        .map_err(|e| CryptoError::Provider(format!("vault key wrap failed: {e}")))?;
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);

    Ok(KeyEnvelope {
        encrypted_vault_key: to_base64(&sealed),
        vault_key_iv: to_base64(&iv),
        vault_key_auth_tag: to_base64(&tag),
        vault_salt: to_base64(salt),
        master_key_kdf_iterations: iterations,
    })
}

/// Unwrap (decrypt) the vault key from an envelope.
///
/// Derives the wrapping key from the salt and iteration count stored in the
/// envelope, never from current defaults. Authentication failure maps to
/// [`CryptoError::Unwrap`] with no further detail.
pub fn unwrap(secret: &SecretString, envelope: &KeyEnvelope) -> CryptoResult<VaultKey> {
    let salt = normalize(&envelope.vault_salt)?;
    let iv = normalize(&envelope.vault_key_iv)?;
    let ciphertext = normalize(&envelope.encrypted_vault_key)?;
    let tag = normalize(&envelope.vault_key_auth_tag)?;

    if iv.len() != IV_SIZE {
        return Err(CryptoError::Format(format!(
            "IV has wrong size: {} bytes (expected {IV_SIZE})",
            iv.len()
        )));
    }
    if tag.len() != TAG_SIZE {
        return Err(CryptoError::Format(format!(
            "auth tag has wrong size: {} bytes (expected {TAG_SIZE})",
            tag.len()
        )));
    }

    let wrapping = derive_wrapping_key(secret, &salt, envelope.master_key_kdf_iterations)?;
    let cipher = Aes256Gcm::new(wrapping.as_bytes().into());

    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(&ciphertext);
    sealed.extend_from_slice(&tag);

    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
        .map_err(|_| CryptoError::Unwrap)?;

    if plaintext.len() != KEY_SIZE {
        plaintext.zeroize();
        return Err(CryptoError::Unwrap);
    }

    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&plaintext);
    plaintext.zeroize();

    Ok(VaultKey::from_bytes(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ITERS: u32 = 1_000;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_vault_key_generation_is_random() {
        let k1 = generate_vault_key();
        let k2 = generate_vault_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let vault_key = generate_vault_key();
        let salt = generate_salt();

        let envelope = wrap(&secret("master-pw"), &vault_key, &salt, TEST_ITERS).unwrap();
        let unwrapped = unwrap(&secret("master-pw"), &envelope).unwrap();

        assert_eq!(vault_key.as_bytes(), unwrapped.as_bytes());
    }

    #[test]
    fn test_unwrap_wrong_secret_fails_generic() {
        let vault_key = generate_vault_key();
        let salt = generate_salt();

        let envelope = wrap(&secret("right"), &vault_key, &salt, TEST_ITERS).unwrap();
        let result = unwrap(&secret("wrong"), &envelope);

        assert!(matches!(result, Err(CryptoError::Unwrap)));
    }

    #[test]
    fn test_wrap_generates_fresh_iv_every_call() {
        let vault_key = generate_vault_key();
        let salt = generate_salt();

        let e1 = wrap(&secret("pw"), &vault_key, &salt, TEST_ITERS).unwrap();
        let e2 = wrap(&secret("pw"), &vault_key, &salt, TEST_ITERS).unwrap();

        assert_ne!(e1.vault_key_iv, e2.vault_key_iv);
        assert_ne!(e1.encrypted_vault_key, e2.encrypted_vault_key);
    }

    #[test]
    fn test_unwrap_uses_stored_iterations_not_default() {
        let vault_key = generate_vault_key();
        let salt = generate_salt();

        // Wrapped with a non-default count; unwrap must still succeed
        // because the count travels inside the envelope.
        let envelope = wrap(&secret("pw"), &vault_key, &salt, 2_345).unwrap();
        assert_eq!(envelope.master_key_kdf_iterations, 2_345);
        let unwrapped = unwrap(&secret("pw"), &envelope).unwrap();
        assert_eq!(vault_key.as_bytes(), unwrapped.as_bytes());
    }

    #[test]
    fn test_dual_wrap_yields_identical_key() {
        let vault_key = generate_vault_key();

        let primary = wrap(&secret("master-pw"), &vault_key, &generate_salt(), TEST_ITERS).unwrap();
        let recovery =
            wrap(&secret("recovery-phrase"), &vault_key, &generate_salt(), TEST_ITERS).unwrap();
        assert_ne!(primary.vault_salt, recovery.vault_salt);

        let from_primary = unwrap(&secret("master-pw"), &primary).unwrap();
        let from_recovery = unwrap(&secret("recovery-phrase"), &recovery).unwrap();
        assert_eq!(from_primary.as_bytes(), from_recovery.as_bytes());
        assert_eq!(from_primary.as_bytes(), vault_key.as_bytes());
    }

    #[test]
    fn test_rotation_rewraps_same_key_bytes() {
        let vault_key = generate_vault_key();
        let old = wrap(&secret("old-pw"), &vault_key, &generate_salt(), TEST_ITERS).unwrap();

        // Rotate: unwrap with old secret, re-wrap under new secret and salt.
        let key = unwrap(&secret("old-pw"), &old).unwrap();
        let new = wrap(&secret("new-pw"), &key, &generate_salt(), TEST_ITERS).unwrap();

        assert!(matches!(unwrap(&secret("old-pw"), &new), Err(CryptoError::Unwrap)));
        let recovered = unwrap(&secret("new-pw"), &new).unwrap();
        assert_eq!(recovered.as_bytes(), vault_key.as_bytes());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let vault_key = generate_vault_key();
        let envelope = wrap(&secret("pw"), &vault_key, &generate_salt(), TEST_ITERS).unwrap();

        let mut ct = normalize(&envelope.encrypted_vault_key).unwrap();
        ct[0] ^= 0x01;
        let tampered = KeyEnvelope {
            encrypted_vault_key: to_base64(&ct),
            ..envelope
        };

        assert!(matches!(unwrap(&secret("pw"), &tampered), Err(CryptoError::Unwrap)));
    }

    #[test]
    fn test_tampered_tag_fails() {
        let vault_key = generate_vault_key();
        let envelope = wrap(&secret("pw"), &vault_key, &generate_salt(), TEST_ITERS).unwrap();

        let mut tag = normalize(&envelope.vault_key_auth_tag).unwrap();
        tag[TAG_SIZE - 1] ^= 0x80;
        let tampered = KeyEnvelope {
            vault_key_auth_tag: to_base64(&tag),
            ..envelope
        };

        assert!(matches!(unwrap(&secret("pw"), &tampered), Err(CryptoError::Unwrap)));
    }

    #[test]
    fn test_unwrap_accepts_hex_encoded_legacy_fields() {
        let vault_key = generate_vault_key();
        let envelope = wrap(&secret("pw"), &vault_key, &generate_salt(), TEST_ITERS).unwrap();

        // A legacy producer stored the IV as hex; the codec shim handles it.
        let legacy = KeyEnvelope {
            vault_key_iv: hex::encode(normalize(&envelope.vault_key_iv).unwrap()),
            ..envelope
        };
        let unwrapped = unwrap(&secret("pw"), &legacy).unwrap();
        assert_eq!(unwrapped.as_bytes(), vault_key.as_bytes());
    }
}
