//! Record cipher: vault item and attachment encryption under the live
//! vault key
//!
//! One primitive for everything the vault stores: structured credential
//! blobs, plain-text notes, and binary attachments. Each encryption draws a
//! fresh random IV; decryption authenticates before releasing a single byte
//! and maps any failure to [`CryptoError::Decryption`].

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use lockit_core::{
    CryptoError, CryptoResult, EncryptedAttachment, EncryptedRecord, RecordData, RecordPayload,
};

use crate::codec::{normalize, to_base64};
use crate::envelope::VaultKey;
use crate::{IV_SIZE, TAG_SIZE};

/// Encrypt raw bytes under the vault key.
///
/// Empty plaintext is valid and round-trips to an empty result.
pub fn encrypt_bytes(plaintext: &[u8], vault_key: &VaultKey) -> CryptoResult<EncryptedRecord> {
    let (iv, ciphertext, tag) = seal(plaintext, vault_key.as_bytes())?;
    Ok(EncryptedRecord {
        data_enc: to_base64(&ciphertext),
        data_iv: to_base64(&iv),
        data_auth_tag: to_base64(&tag),
    })
}

/// Decrypt raw bytes under the vault key.
pub fn decrypt_bytes(record: &EncryptedRecord, vault_key: &VaultKey) -> CryptoResult<Vec<u8>> {
    open(
        &record.data_enc,
        &record.data_iv,
        &record.data_auth_tag,
        vault_key.as_bytes(),
    )
}

/// Encrypt a structured vault item.
///
/// The tagged union serializes to one canonical JSON document; the category
/// tag travels inside the ciphertext, so the server cannot tell a login from
/// a credit card.
pub fn encrypt_record(data: &RecordData, vault_key: &VaultKey) -> CryptoResult<EncryptedRecord> {
    let plaintext = serde_json::to_vec(data)
        .map_err(|e| CryptoError::Provider(format!("record serialization failed: {e}")))?;
    encrypt_bytes(&plaintext, vault_key)
}

/// Decrypt a vault item, tolerating historical plaintext shapes.
///
/// Tries the structured form first, then plain UTF-8 text, then raw bytes.
/// The fallbacks only run after authentication has already succeeded; a bad
/// key or tampered blob never reaches them.
pub fn decrypt_record(
    record: &EncryptedRecord,
    vault_key: &VaultKey,
) -> CryptoResult<RecordPayload> {
    let plaintext = decrypt_bytes(record, vault_key)?;

    if let Ok(data) = serde_json::from_slice::<RecordData>(&plaintext) {
        return Ok(RecordPayload::Structured(data));
    }
    match String::from_utf8(plaintext) {
        Ok(text) => Ok(RecordPayload::Text(text)),
        Err(e) => Ok(RecordPayload::Binary(e.into_bytes())),
    }
}

/// Encrypt attachment content under the vault key.
pub fn encrypt_attachment(
    content: &[u8],
    vault_key: &VaultKey,
) -> CryptoResult<EncryptedAttachment> {
    let (iv, ciphertext, tag) = seal(content, vault_key.as_bytes())?;
    Ok(EncryptedAttachment {
        encrypted_data: to_base64(&ciphertext),
        data_iv: to_base64(&iv),
        data_auth_tag: to_base64(&tag),
    })
}

/// Decrypt attachment content under the vault key.
pub fn decrypt_attachment(
    attachment: &EncryptedAttachment,
    vault_key: &VaultKey,
) -> CryptoResult<Vec<u8>> {
    open(
        &attachment.encrypted_data,
        &attachment.data_iv,
        &attachment.data_auth_tag,
        vault_key.as_bytes(),
    )
}

/// AES-256-GCM encrypt with a fresh IV; returns (iv, ciphertext, tag).
pub(crate) fn seal(
    plaintext: &[u8],
    key: &[u8; 32],
) -> CryptoResult<([u8; IV_SIZE], Vec<u8>, Vec<u8>)> {
    let cipher = Aes256Gcm::new(key.into());

    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| CryptoError::Provider(format!("record encryption failed: {e}")))?;
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);

    Ok((iv, sealed, tag))
}

/// AES-256-GCM decrypt of split base64 fields; fails closed on any
/// authentication mismatch.
pub(crate) fn open(
    data_enc: &str,
    data_iv: &str,
    data_auth_tag: &str,
    key: &[u8; 32],
) -> CryptoResult<Vec<u8>> {
    // Empty plaintext is legal, so an empty ciphertext field is too; the
    // tag still authenticates it.
    let ciphertext = if data_enc.is_empty() {
        Vec::new()
    } else {
        normalize(data_enc)?
    };
    let iv = normalize(data_iv)?;
    let tag = normalize(data_auth_tag)?;

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

    let cipher = Aes256Gcm::new(key.into());
    let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
    sealed.extend_from_slice(&ciphertext);
    sealed.extend_from_slice(&tag);

    cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
        .map_err(|_| CryptoError::Decryption)
}
