//! Vault session: the single owner of the in-memory vault key
//!
//! Every consumer of the vault key goes through [`VaultSession::vault_key`],
//! which re-checks the lock state at call time; nothing else in the
//! application holds the key as ambient state. The KDF pass runs on the
//! blocking pool so an unlock never stalls the async executor.

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use lockit_core::{CryptoError, CryptoResult, KeyEnvelope};
use lockit_crypto::{
    generate_recovery_phrase, generate_salt, generate_vault_key, unwrap,
    validate_recovery_phrase, wrap, VaultKey, DEFAULT_KDF_ITERATIONS,
};

use crate::store::{EnvelopeSlot, EnvelopeStore};

/// Lifecycle state of the vault key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No vault key in memory.
    Locked,
    /// A KDF/unwrap pass is in flight.
    Unlocking,
    /// The vault key is resident in volatile memory.
    Unlocked,
}

struct SessionInner {
    state: VaultState,
    vault_key: Option<VaultKey>,
}

/// Owns the vault key and its exposure window.
pub struct VaultSession<S> {
    store: S,
    inner: Mutex<SessionInner>,
    // Serializes unlock attempts: each one is an expensive KDF pass, so
    // concurrent callers coalesce behind whoever got here first instead of
    // racing duplicate derivations.
    unlock_gate: Mutex<()>,
}

impl<S: EnvelopeStore> VaultSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            inner: Mutex::new(SessionInner {
                state: VaultState::Locked,
                vault_key: None,
            }),
            unlock_gate: Mutex::new(()),
        }
    }

    pub async fn state(&self) -> VaultState {
        self.inner.lock().await.state
    }

    /// First-time setup: generate the vault key, wrap it under the master
    /// password, persist the primary envelope, and end up unlocked.
    ///
    /// The vault key generated here is the one this user keeps for life;
    /// password changes re-wrap it, they never replace it. Fails if a
    /// primary envelope already exists — overwriting it would orphan every
    /// record encrypted under the old key. Re-keying the wrap goes through
    /// [`Self::change_master_password`] instead.
    pub async fn signup(&self, secret: SecretString) -> CryptoResult<()> {
        let _gate = self.unlock_gate.lock().await;

        if self
            .store
            .load(EnvelopeSlot::Primary)
            .await
            .map_err(store_error)?
            .is_some()
        {
            return Err(CryptoError::Provider(
                "vault already initialized; a primary envelope exists".into(),
            ));
        }

        let vault_key = generate_vault_key();
        let envelope = wrap_blocking(secret, vault_key.clone(), generate_salt()).await?;

        self.store
            .save(EnvelopeSlot::Primary, &envelope)
            .await
            .map_err(store_error)?;

        let mut inner = self.inner.lock().await;
        inner.vault_key = Some(vault_key);
        inner.state = VaultState::Unlocked;
        tracing::info!("vault created and unlocked");
        Ok(())
    }

    /// Unlock with the master password against the primary envelope.
    pub async fn unlock(&self, secret: SecretString) -> CryptoResult<()> {
        self.unlock_slot(secret, EnvelopeSlot::Primary).await
    }

    /// Unlock with the recovery phrase against the recovery envelope.
    ///
    /// The phrase is checksum-validated first so a typo is reported as such
    /// instead of burning a KDF pass and surfacing as a generic failure.
    pub async fn unlock_with_recovery(&self, phrase: SecretString) -> CryptoResult<()> {
        validate_recovery_phrase(phrase.expose_secret())?;
        self.unlock_slot(phrase, EnvelopeSlot::Recovery).await
    }

    async fn unlock_slot(&self, secret: SecretString, slot: EnvelopeSlot) -> CryptoResult<()> {
        let _gate = self.unlock_gate.lock().await;

        {
            let mut inner = self.inner.lock().await;
            if inner.state == VaultState::Unlocked {
                // A concurrent unlock already finished the job.
                return Ok(());
            }
            inner.state = VaultState::Unlocking;
        }

        let result = self.unwrap_slot(secret, slot).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(vault_key) => {
                if inner.state != VaultState::Unlocking {
                    // lock() ran while the KDF was in flight; its decision
                    // wins and the freshly unwrapped key is discarded.
                    return Err(CryptoError::Locked);
                }
                inner.vault_key = Some(vault_key);
                inner.state = VaultState::Unlocked;
                tracing::info!(slot = ?slot, "vault unlocked");
                Ok(())
            }
            Err(e) => {
                inner.vault_key = None;
                inner.state = VaultState::Locked;
                tracing::warn!(slot = ?slot, "unlock failed");
                Err(e)
            }
        }
    }

    async fn unwrap_slot(&self, secret: SecretString, slot: EnvelopeSlot) -> CryptoResult<VaultKey> {
        let envelope = self
            .store
            .load(slot)
            .await
            .map_err(store_error)?
            .ok_or_else(|| CryptoError::Provider("no envelope enrolled for this slot".into()))?;

        unwrap_blocking(secret, envelope).await
    }

    /// Discard the vault key unconditionally. Idempotent; safe to call from
    /// explicit user action, session invalidation, and the inactivity timer
    /// alike.
    pub async fn lock(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != VaultState::Locked {
            tracing::info!("vault locked");
        }
        // Dropping the key zeroizes it.
        inner.vault_key = None;
        inner.state = VaultState::Locked;
    }

    /// Hand out the vault key for a record operation, or fail if the vault
    /// is not unlocked.
    ///
    /// Callers must fetch per operation rather than caching the result; a
    /// timeout lock can land between any two calls.
    pub async fn vault_key(&self) -> CryptoResult<VaultKey> {
        let inner = self.inner.lock().await;
        match (&inner.state, &inner.vault_key) {
            (VaultState::Unlocked, Some(key)) => Ok(key.clone()),
            _ => Err(CryptoError::Locked),
        }
    }

    /// Rotate the master password: prove the old one by unwrapping the
    /// primary envelope, then re-wrap the same vault key bytes under the new
    /// password and a fresh salt. Stored records are untouched.
    pub async fn change_master_password(
        &self,
        old_secret: SecretString,
        new_secret: SecretString,
    ) -> CryptoResult<()> {
        let _gate = self.unlock_gate.lock().await;

        let vault_key = self.unwrap_slot(old_secret, EnvelopeSlot::Primary).await?;
        let envelope = wrap_blocking(new_secret, vault_key.clone(), generate_salt()).await?;

        self.store
            .save(EnvelopeSlot::Primary, &envelope)
            .await
            .map_err(store_error)?;

        // If the session was unlocked, the key it holds is still the right
        // one; only the wrap changed.
        tracing::info!("master password rotated");
        Ok(())
    }

    /// Generate a recovery phrase and persist a second, independently-salted
    /// wrap of the current vault key under it. Requires an unlocked vault.
    ///
    /// Returns the phrase for one-time display; it is never stored.
    pub async fn enroll_recovery_phrase(&self) -> CryptoResult<SecretString> {
        let vault_key = self.vault_key().await?;
        let phrase = generate_recovery_phrase()?;

        let wrap_secret = SecretString::from(phrase.expose_secret().to_owned());
        let envelope = wrap_blocking(wrap_secret, vault_key, generate_salt()).await?;
        self.store
            .save(EnvelopeSlot::Recovery, &envelope)
            .await
            .map_err(store_error)?;

        tracing::info!("recovery phrase enrolled");
        Ok(phrase)
    }
}

async fn wrap_blocking(
    secret: SecretString,
    vault_key: VaultKey,
    salt: [u8; lockit_crypto::SALT_SIZE],
) -> CryptoResult<KeyEnvelope> {
    tokio::task::spawn_blocking(move || {
        wrap(&secret, &vault_key, &salt, DEFAULT_KDF_ITERATIONS)
    })
    .await
    .map_err(|e| CryptoError::Provider(format!("wrap task failed: {e}")))?
}

async fn unwrap_blocking(secret: SecretString, envelope: KeyEnvelope) -> CryptoResult<VaultKey> {
    tokio::task::spawn_blocking(move || unwrap(&secret, &envelope))
        .await
        .map_err(|e| CryptoError::Provider(format!("unwrap task failed: {e}")))?
}

fn store_error(e: anyhow::Error) -> CryptoError {
    CryptoError::Provider(format!("envelope store failure: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEnvelopeStore;
    use std::sync::Arc;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn test_starts_locked() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        assert_eq!(session.state().await, VaultState::Locked);
        assert!(matches!(session.vault_key().await, Err(CryptoError::Locked)));
    }

    #[tokio::test]
    async fn test_signup_then_relock_then_unlock() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("master-pw")).await.unwrap();
        assert_eq!(session.state().await, VaultState::Unlocked);

        let key_at_signup = session.vault_key().await.unwrap();

        session.lock().await;
        assert_eq!(session.state().await, VaultState::Locked);

        session.unlock(secret("master-pw")).await.unwrap();
        let key_after_unlock = session.vault_key().await.unwrap();
        assert_eq!(key_at_signup.as_bytes(), key_after_unlock.as_bytes());
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_vault_locked() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("master-pw")).await.unwrap();
        session.lock().await;

        let result = session.unlock(secret("wrong-password")).await;
        assert!(matches!(result, Err(CryptoError::Unwrap)));
        assert_eq!(session.state().await, VaultState::Locked);
        assert!(matches!(session.vault_key().await, Err(CryptoError::Locked)));
    }

    #[tokio::test]
    async fn test_lock_is_idempotent() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.lock().await;
        session.lock().await;
        assert_eq!(session.state().await, VaultState::Locked);
    }

    #[tokio::test]
    async fn test_lock_purges_access() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("master-pw")).await.unwrap();

        // A caller may have fetched the key earlier; the gate is the
        // session state, which must refuse after lock regardless.
        let _captured = session.vault_key().await.unwrap();
        session.lock().await;
        assert!(matches!(session.vault_key().await, Err(CryptoError::Locked)));
    }

    #[tokio::test]
    async fn test_signup_refuses_to_overwrite_existing_vault() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("master-pw")).await.unwrap();
        let original = session.vault_key().await.unwrap();

        let result = session.signup(secret("other-pw")).await;
        assert!(matches!(result, Err(CryptoError::Provider(_))));

        // The enrolled envelope and resident key are untouched.
        assert_eq!(session.vault_key().await.unwrap().as_bytes(), original.as_bytes());
        session.lock().await;
        session.unlock(secret("master-pw")).await.unwrap();
        assert_eq!(session.vault_key().await.unwrap().as_bytes(), original.as_bytes());
    }

    #[tokio::test]
    async fn test_unlock_without_enrollment_fails() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        let result = session.unlock(secret("anything")).await;
        assert!(matches!(result, Err(CryptoError::Provider(_))));
        assert_eq!(session.state().await, VaultState::Locked);
    }

    #[tokio::test]
    async fn test_concurrent_unlocks_coalesce() {
        let session = Arc::new(VaultSession::new(MemoryEnvelopeStore::new()));
        session.signup(secret("master-pw")).await.unwrap();
        session.lock().await;

        let a = {
            let session = session.clone();
            tokio::spawn(async move { session.unlock(secret("master-pw")).await })
        };
        let b = {
            let session = session.clone();
            tokio::spawn(async move { session.unlock(secret("master-pw")).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert_eq!(session.state().await, VaultState::Unlocked);
    }

    #[tokio::test]
    async fn test_password_change_keeps_vault_key() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("old-pw")).await.unwrap();
        let original = session.vault_key().await.unwrap();

        session
            .change_master_password(secret("old-pw"), secret("new-pw"))
            .await
            .unwrap();

        session.lock().await;
        assert!(matches!(
            session.unlock(secret("old-pw")).await,
            Err(CryptoError::Unwrap)
        ));
        session.unlock(secret("new-pw")).await.unwrap();
        assert_eq!(session.vault_key().await.unwrap().as_bytes(), original.as_bytes());
    }

    #[tokio::test]
    async fn test_password_change_requires_old_password() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("old-pw")).await.unwrap();

        let result = session
            .change_master_password(secret("not-old-pw"), secret("new-pw"))
            .await;
        assert!(matches!(result, Err(CryptoError::Unwrap)));
    }

    #[tokio::test]
    async fn test_recovery_phrase_unlocks_same_key() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("master-pw")).await.unwrap();
        let original = session.vault_key().await.unwrap();

        let phrase = session.enroll_recovery_phrase().await.unwrap();
        session.lock().await;

        session.unlock_with_recovery(phrase).await.unwrap();
        assert_eq!(session.vault_key().await.unwrap().as_bytes(), original.as_bytes());
    }

    #[tokio::test]
    async fn test_recovery_enrollment_requires_unlocked_vault() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        session.signup(secret("master-pw")).await.unwrap();
        session.lock().await;

        let result = session.enroll_recovery_phrase().await;
        assert!(matches!(result, Err(CryptoError::Locked)));
    }

    #[tokio::test]
    async fn test_mistyped_recovery_phrase_is_a_format_error() {
        let session = VaultSession::new(MemoryEnvelopeStore::new());
        let result = session
            .unlock_with_recovery(secret("definitely not a mnemonic"))
            .await;
        assert!(matches!(result, Err(CryptoError::Format(_))));
    }
}
