//! lockit-core: shared types for the lockit envelope-encryption core
//!
//! Holds everything both the cryptographic core and its consumers agree on:
//! the error taxonomy, the server-opaque wire structs, and the plaintext
//! record model. No cryptography lives here.

pub mod error;
pub mod record;
pub mod types;

pub use error::{CryptoError, CryptoResult};
pub use record::{RecordData, RecordPayload};
pub use types::{
    EncryptedAttachment, EncryptedRecord, KeyEnvelope, SendEnvelope, SendKind,
    SEND_FORMAT_VERSION,
};
