//! lockit-vault: vault key lifecycle for LockIt
//!
//! State machine:
//! ```text
//! Locked ──unlock/signup──► Unlocking ──success──► Unlocked
//!   ▲                           │failure               │
//!   └───────────────────────────┴── lock() / timeout ◄─┘
//! ```
//!
//! [`VaultSession`] is the only holder of the plaintext vault key; it lives
//! in volatile memory from unlock to lock and nowhere else. The envelope it
//! is unwrapped from travels through the [`EnvelopeStore`] seam as opaque
//! ciphertext. [`spawn_auto_lock`] adds the inactivity timeout, the one
//! autonomous state transition in the system.

pub mod session;
pub mod store;
pub mod timer;

pub use session::{VaultSession, VaultState};
pub use store::{EnvelopeSlot, EnvelopeStore, MemoryEnvelopeStore};
pub use timer::{spawn_auto_lock, AutoLockConfig, AutoLockEvent, AutoLockHandle};
