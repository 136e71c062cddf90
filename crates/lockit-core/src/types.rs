//! Wire types exchanged with the persistence and transport channels.
//!
//! Field names serialize in camelCase to match the REST payloads and the
//! `.lockit` document format exactly. Everything here is server-opaque
//! ciphertext plus the non-secret parameters needed to decrypt it; no type
//! in this module ever carries plaintext key material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The vault key at rest: AES-256-GCM ciphertext of the vault key under a
/// password-derived wrapping key, plus the KDF parameters used.
///
/// Two of these can coexist per user (primary wrap under the master
/// password, recovery wrap under the recovery phrase); both decrypt to the
/// identical vault key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEnvelope {
    /// Base64 ciphertext of the 32 vault-key bytes.
    pub encrypted_vault_key: String,
    /// Base64 96-bit GCM IV, freshly random per wrap.
    pub vault_key_iv: String,
    /// Base64 128-bit GCM authentication tag.
    pub vault_key_auth_tag: String,
    /// Base64 KDF salt (>= 16 bytes), unique per wrap.
    pub vault_salt: String,
    /// PBKDF2 iteration count this envelope was wrapped with. Stored so the
    /// envelope stays decryptable if the compiled-in default changes.
    pub master_key_kdf_iterations: u32,
}

/// A credential blob encrypted under the vault key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    pub data_enc: String,
    pub data_iv: String,
    pub data_auth_tag: String,
}

/// A file attachment encrypted under the vault key. Same semantics as
/// [`EncryptedRecord`] over binary content; the field names differ because
/// the persistence schema stores attachments in their own table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedAttachment {
    pub encrypted_data: String,
    pub data_iv: String,
    pub data_auth_tag: String,
}

/// Payload category of a Send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendKind {
    Text,
    File,
    Credential,
}

/// The `.lockit` document: a one-shot encrypted payload exported as a
/// standalone JSON file for out-of-band sharing.
///
/// `encrypted_content` is base64 of `ciphertext || tag` (the format carries
/// no separate tag field). The format also carries no KDF salt: the content
/// key is derived from the access password with a fixed domain salt, or is a
/// compiled-in constant for unprotected Sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEnvelope {
    pub version: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SendKind,
    pub encrypted_content: String,
    pub content_iv: String,
    pub password_protected: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
}

/// Format version written into every new `.lockit` document.
pub const SEND_FORMAT_VERSION: &str = "1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_camel_case() {
        let env = KeyEnvelope {
            encrypted_vault_key: "Y3Q=".into(),
            vault_key_iv: "aXY=".into(),
            vault_key_auth_tag: "dGFn".into(),
            vault_salt: "c2FsdA==".into(),
            master_key_kdf_iterations: 100_000,
        };
        let json = serde_json::to_value(&env).unwrap();
        assert!(json.get("encryptedVaultKey").is_some());
        assert!(json.get("masterKeyKdfIterations").is_some());
        assert!(json.get("encrypted_vault_key").is_none());
    }

    #[test]
    fn test_send_kind_tag_is_lowercase_type() {
        let send = SendEnvelope {
            version: SEND_FORMAT_VERSION.into(),
            id: "abc".into(),
            name: "note".into(),
            kind: SendKind::Text,
            encrypted_content: "Y3Q=".into(),
            content_iv: "aXY=".into(),
            password_protected: true,
            created_at: Utc::now(),
            filename: None,
            file_extension: None,
        };
        let json = serde_json::to_value(&send).unwrap();
        assert_eq!(json["type"], "text");
        assert!(json.get("filename").is_none(), "None fields are omitted");
    }
}
