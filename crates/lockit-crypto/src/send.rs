//! Send envelopes: one-shot encrypted payloads exported as `.lockit` files
//!
//! A Send is sealed once, downloaded, and opened out-of-band by whoever
//! holds the access password. The document format (§`SendEnvelope`) carries
//! no KDF salt, so the content key is derived with a fixed domain salt; the
//! access password is the only secret input.
//!
//! Unprotected Sends encrypt under a compiled-in constant key. That is
//! obfuscation, not confidentiality: anyone holding the file can open it.
//! It exists so both paths share one cipher code path, and is documented as
//! a non-goal rather than a security boundary.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use chrono::Utc;
use secrecy::SecretString;
use uuid::Uuid;

use lockit_core::{
    CryptoError, CryptoResult, RecordData, SendEnvelope, SendKind, SEND_FORMAT_VERSION,
};

use crate::codec::{from_base64, normalize, to_base64};
use crate::kdf::{derive_wrapping_key, WrappingKey};
use crate::record::seal;
use crate::{DEFAULT_KDF_ITERATIONS, IV_SIZE};

/// Fixed KDF salt for password-protected Sends. The `.lockit` format stores
/// no salt field, so both ends must agree on it; the password provides the
/// secrecy.
const SEND_KDF_SALT: [u8; 16] = *b"lockit-send-v1.0";

/// Constant key for unprotected Sends. Shared across every unprotected Send
/// ever created; provides no confidentiality.
const UNPROTECTED_SEND_KEY: [u8; 32] = *b"lockit-unprotected-send-key-v1.0";

/// Plaintext payload of a Send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendContent {
    Text(String),
    File {
        filename: String,
        extension: Option<String>,
        bytes: Vec<u8>,
    },
    Credential(RecordData),
}

/// Seal a payload into a `.lockit` document.
///
/// The content string form mirrors what historical receivers expect: text
/// verbatim, file bytes base64-encoded, credentials as a JSON document. The
/// GCM tag stays appended to the ciphertext because the format has no
/// separate tag field.
pub fn create_send(
    name: &str,
    content: &SendContent,
    password: Option<&SecretString>,
) -> CryptoResult<SendEnvelope> {
    let key = send_key(password)?;

    let (kind, plaintext, filename, extension) = match content {
        SendContent::Text(text) => (SendKind::Text, text.clone(), None, None),
        SendContent::File {
            filename,
            extension,
            bytes,
        } => (
            SendKind::File,
            to_base64(bytes),
            Some(filename.clone()),
            extension.clone(),
        ),
        SendContent::Credential(data) => {
            let json = serde_json::to_string(data)
                .map_err(|e| CryptoError::Provider(format!("send serialization failed: {e}")))?;
            (SendKind::Credential, json, None, None)
        }
    };

    let (iv, mut sealed, tag) = seal(plaintext.as_bytes(), key.as_bytes())?;
    sealed.extend_from_slice(&tag);

    Ok(SendEnvelope {
        version: SEND_FORMAT_VERSION.into(),
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        kind,
        encrypted_content: to_base64(&sealed),
        content_iv: to_base64(&iv),
        password_protected: password.is_some(),
        created_at: Utc::now(),
        filename,
        file_extension: extension,
    })
}

/// Open a `.lockit` document.
///
/// A wrong or missing password surfaces as [`CryptoError::Decryption`], the
/// same signal as a corrupted file.
pub fn open_send(
    envelope: &SendEnvelope,
    password: Option<&SecretString>,
) -> CryptoResult<SendContent> {
    if envelope.version != SEND_FORMAT_VERSION {
        return Err(CryptoError::Format(format!(
            "unsupported send format version: {}",
            envelope.version
        )));
    }
    if envelope.password_protected && password.is_none() {
        return Err(CryptoError::Decryption);
    }

    let key = send_key(if envelope.password_protected {
        password
    } else {
        None
    })?;

    let sealed = from_base64(&envelope.encrypted_content)?;
    let iv = normalize(&envelope.content_iv)?;
    if iv.len() != IV_SIZE {
        return Err(CryptoError::Format(format!(
            "IV has wrong size: {} bytes (expected {IV_SIZE})",
            iv.len()
        )));
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
        .map_err(|_| CryptoError::Decryption)?;
    let text = String::from_utf8(plaintext)
        .map_err(|e| CryptoError::Format(format!("send content is not UTF-8: {e}")))?;

    match envelope.kind {
        SendKind::Text => Ok(SendContent::Text(text)),
        SendKind::File => Ok(SendContent::File {
            filename: envelope.filename.clone().unwrap_or_default(),
            extension: envelope.file_extension.clone(),
            bytes: from_base64(&text)?,
        }),
        SendKind::Credential => {
            let data: RecordData = serde_json::from_str(&text)
                .map_err(|e| CryptoError::Format(format!("malformed credential send: {e}")))?;
            Ok(SendContent::Credential(data))
        }
    }
}

fn send_key(password: Option<&SecretString>) -> CryptoResult<WrappingKey> {
    match password {
        Some(pw) => derive_wrapping_key(pw, &SEND_KDF_SALT, DEFAULT_KDF_ITERATIONS),
        None => Ok(WrappingKey::from_bytes(UNPROTECTED_SEND_KEY)),
    }
}
