//! Recovery phrase generation
//!
//! At enrollment a 24-word BIP-39 mnemonic is generated and shown once; the
//! user writes it down and it is never stored digitally. The phrase is just
//! another secret to the envelope unit: the vault key gets a second wrap
//! under it, with its own random salt, via the normal PBKDF2 path.

use bip39::Mnemonic;
use rand::RngCore;
use secrecy::SecretString;

use lockit_core::{CryptoError, CryptoResult};

/// Generate a fresh 24-word recovery phrase (256 bits of entropy).
pub fn generate_recovery_phrase() -> CryptoResult<SecretString> {
    let mut entropy = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| CryptoError::Provider(format!("recovery phrase generation failed: {e}")))?;
    Ok(SecretString::from(mnemonic.to_string()))
}

/// Checksum-validate a user-entered recovery phrase before spending a KDF
/// pass on it. A typo fails here with a format error rather than surfacing
/// later as a generic unwrap failure.
pub fn validate_recovery_phrase(words: &str) -> CryptoResult<()> {
    let _mnemonic: Mnemonic = words
        .trim()
        .parse()
        .map_err(|e| CryptoError::Format(format!("invalid recovery phrase: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_phrase_has_24_words_and_validates() {
        let phrase = generate_recovery_phrase().unwrap();
        assert_eq!(phrase.expose_secret().split_whitespace().count(), 24);
        validate_recovery_phrase(phrase.expose_secret()).unwrap();
    }

    #[test]
    fn test_phrases_are_unique() {
        let p1 = generate_recovery_phrase().unwrap();
        let p2 = generate_recovery_phrase().unwrap();
        assert_ne!(p1.expose_secret(), p2.expose_secret());
    }

    #[test]
    fn test_garbage_phrase_is_rejected() {
        let result = validate_recovery_phrase("not a valid mnemonic at all");
        assert!(matches!(result, Err(CryptoError::Format(_))));
    }
}
