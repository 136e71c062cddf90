//! Envelope persistence seam
//!
//! The lifecycle manager only ever hands the server opaque [`KeyEnvelope`]
//! documents and gets them back verbatim; what sits behind this trait (a
//! REST client in production, memory in tests) is outside the crypto core.

use std::future::Future;

use anyhow::Result;
use tokio::sync::RwLock;

use lockit_core::KeyEnvelope;

/// Which wrap of the vault key an envelope is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeSlot {
    /// Wrapped under the master password.
    Primary,
    /// Wrapped under the recovery phrase.
    Recovery,
}

/// Storage channel for vault key envelopes.
pub trait EnvelopeStore: Send + Sync {
    fn load(&self, slot: EnvelopeSlot) -> impl Future<Output = Result<Option<KeyEnvelope>>> + Send;

    fn save(
        &self,
        slot: EnvelopeSlot,
        envelope: &KeyEnvelope,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory store for tests and examples.
#[derive(Default)]
pub struct MemoryEnvelopeStore {
    primary: RwLock<Option<KeyEnvelope>>,
    recovery: RwLock<Option<KeyEnvelope>>,
}

impl MemoryEnvelopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, slot: EnvelopeSlot) -> &RwLock<Option<KeyEnvelope>> {
        match slot {
            EnvelopeSlot::Primary => &self.primary,
            EnvelopeSlot::Recovery => &self.recovery,
        }
    }
}

impl EnvelopeStore for MemoryEnvelopeStore {
    async fn load(&self, slot: EnvelopeSlot) -> Result<Option<KeyEnvelope>> {
        Ok(self.slot(slot).read().await.clone())
    }

    async fn save(&self, slot: EnvelopeSlot, envelope: &KeyEnvelope) -> Result<()> {
        *self.slot(slot).write().await = Some(envelope.clone());
        Ok(())
    }
}
