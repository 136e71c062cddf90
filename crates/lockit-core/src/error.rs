use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Error taxonomy for the cryptographic core.
///
/// `Unwrap` and `Decryption` carry fixed generic messages on purpose: an
/// authentication failure is indistinguishable from storage corruption, and
/// the error text must not give a caller (or an attacker reading UI output)
/// a more granular oracle.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("unrecognized encoding: {0}")]
    Format(String),

    #[error("key derivation rejected: {0}")]
    KeyDerivation(String),

    #[error("incorrect password or corrupted envelope")]
    Unwrap,

    #[error("vault key incorrect or data corrupted")]
    Decryption,

    #[error("vault is locked")]
    Locked,

    /// Failure inside the cryptographic provider itself (payload over the
    /// AES-GCM length limit, malformed KDF parameters). Not reachable from
    /// well-formed inputs; kept separate so it is never mistaken for a
    /// wrong-password signal.
    #[error("crypto provider failure: {0}")]
    Provider(String),
}
