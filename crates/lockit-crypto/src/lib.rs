//! lockit-crypto: client-side envelope encryption for LockIt
//!
//! The server only ever sees opaque ciphertext; every key and every plaintext
//! below the wrapping layer exists solely in client memory.
//!
//! Key hierarchy:
//! ```text
//! Master password ── PBKDF2-HMAC-SHA256 (salt, 100k iters) ──► WrappingKey
//! Recovery phrase ── same KDF, independent salt ─────────────► WrappingKey'
//!   WrappingKey(')  ── AES-256-GCM ──► KeyEnvelope (vault key at rest)
//! VaultKey (256-bit random, generated once at signup)
//!   ├── credential blobs:   AES-256-GCM → EncryptedRecord
//!   └── file attachments:   AES-256-GCM → EncryptedAttachment
//! Send access password ── PBKDF2, fixed domain salt ──► per-Send key
//!   └── Send payload:       AES-256-GCM → SendEnvelope (.lockit file)
//! ```
//!
//! Password rotation re-wraps the same vault key bytes under a fresh salt,
//! so stored records never need re-encryption.

pub mod codec;
pub mod envelope;
pub mod kdf;
pub mod record;
pub mod recovery;
pub mod send;

pub use codec::{from_base64, normalize, to_base64};
pub use envelope::{generate_salt, generate_vault_key, unwrap, wrap, VaultKey};
pub use kdf::{derive_auth_hash, derive_wrapping_key, WrappingKey};
pub use record::{
    decrypt_attachment, decrypt_bytes, decrypt_record, encrypt_attachment, encrypt_bytes,
    encrypt_record,
};
pub use recovery::{generate_recovery_phrase, validate_recovery_phrase};
pub use send::{create_send, open_send, SendContent};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM IV (96-bit)
pub const IV_SIZE: usize = 12;

/// Size of a GCM authentication tag (128-bit)
pub const TAG_SIZE: usize = 16;

/// Size of a freshly generated KDF salt
pub const SALT_SIZE: usize = 16;

/// Minimum accepted KDF salt length
pub const MIN_SALT_SIZE: usize = 16;

/// PBKDF2 iteration count for new envelopes. Historical envelopes decrypt
/// with the count stored inside them, never with this value.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;
