//! Handle registry: the lifecycle manager hosts talk to
//!
//! Hosts never hold a [`Session`] directly; they get an opaque [`DuelHandle`]
//! and every operation goes through the registry. A stale or unknown handle
//! is rejected, never dereferenced.

use crate::codec::{DuelCodec, OcgCodec};
use crate::engine::{DuelCallbacks, EngineFactory};
use crate::session::Session;
use duel_core::{BridgeConfig, DuelError, DuelOptions, DuelStatus, NewCard, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Opaque session handle. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuelHandle(u64);

impl DuelHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DuelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duel#{}", self.0)
    }
}

/// Registry of live sessions
pub struct DuelRegistry<F: EngineFactory, C: DuelCodec + Clone = OcgCodec> {
    sessions: HashMap<DuelHandle, Session<F::Engine, C>>,
    next_id: u64,
    factory: F,
    callbacks: Arc<dyn DuelCallbacks>,
    codec: C,
    config: BridgeConfig,
}

impl<F: EngineFactory> DuelRegistry<F, OcgCodec> {
    /// Registry using the ocgcore codec
    pub fn new(factory: F, callbacks: Arc<dyn DuelCallbacks>, config: BridgeConfig) -> Self {
        Self::with_codec(factory, callbacks, OcgCodec::new(), config)
    }
}

impl<F: EngineFactory, C: DuelCodec + Clone> DuelRegistry<F, C> {
    pub fn with_codec(
        factory: F,
        callbacks: Arc<dyn DuelCallbacks>,
        codec: C,
        config: BridgeConfig,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
            factory,
            callbacks,
            codec,
            config,
        }
    }

    /// Create a duel and return its handle
    pub fn create(&mut self, options: &DuelOptions) -> Result<DuelHandle> {
        if self.sessions.len() >= self.config.max_sessions {
            return Err(DuelError::ResourceExhausted(format!(
                "session limit of {} reached",
                self.config.max_sessions
            )));
        }

        let session = Session::create(
            &self.factory,
            options,
            Arc::clone(&self.callbacks),
            self.codec.clone(),
            self.config.clone(),
        )?;

        let handle = DuelHandle(self.next_id);
        self.next_id += 1;
        self.sessions.insert(handle, session);
        debug!(%handle, live = self.sessions.len(), "Session registered");
        Ok(handle)
    }

    /// Destroy a duel. Unknown or already destroyed handles are ignored.
    pub fn destroy(&mut self, handle: DuelHandle) {
        match self.sessions.remove(&handle) {
            Some(mut session) => session.destroy(),
            None => debug!(%handle, "Destroy on unknown handle ignored"),
        }
    }

    pub fn get(&self, handle: DuelHandle) -> Option<&Session<F::Engine, C>> {
        self.sessions.get(&handle)
    }

    pub fn get_mut(&mut self, handle: DuelHandle) -> Result<&mut Session<F::Engine, C>> {
        self.sessions
            .get_mut(&handle)
            .ok_or(DuelError::InvalidHandle(handle.0))
    }

    pub fn add_card(&mut self, handle: DuelHandle, card: &NewCard) -> Result<()> {
        self.get_mut(handle)?.add_card(card)
    }

    pub fn start(&mut self, handle: DuelHandle) -> Result<()> {
        self.get_mut(handle)?.start()
    }

    pub fn advance(&mut self, handle: DuelHandle) -> Result<DuelStatus> {
        self.get_mut(handle)?.advance()
    }

    pub fn next_message(&mut self, handle: DuelHandle) -> Result<Option<&[u8]>> {
        self.get_mut(handle)?.next_message()
    }

    pub fn apply_answer(&mut self, handle: DuelHandle, answer: &[u8]) -> Result<()> {
        self.get_mut(handle)?.apply_answer(answer)
    }

    /// Number of live sessions
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn available_slots(&self) -> usize {
        self.config.max_sessions.saturating_sub(self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CardLibrary, DuelEngine};
    use duel_core::location;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct IdleEngine {
        drops: Arc<AtomicUsize>,
    }

    impl DuelEngine for IdleEngine {
        fn add_card(&mut self, _card: &NewCard) {}
        fn start(&mut self) {}
        fn process(&mut self) -> DuelStatus {
            DuelStatus::Ended
        }
        fn pending_output(&mut self) -> Option<&[u8]> {
            None
        }
        fn set_response(&mut self, _response: &[u8]) {}
    }

    impl Drop for IdleEngine {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct IdleFactory {
        drops: Arc<AtomicUsize>,
        refuse: bool,
    }

    impl EngineFactory for IdleFactory {
        type Engine = IdleEngine;

        fn create(
            &self,
            _options: &DuelOptions,
            _callbacks: Arc<dyn DuelCallbacks>,
        ) -> std::result::Result<IdleEngine, String> {
            if self.refuse {
                return Err("engine offline".into());
            }
            Ok(IdleEngine {
                drops: Arc::clone(&self.drops),
            })
        }
    }

    fn registry(factory: IdleFactory, max_sessions: usize) -> DuelRegistry<IdleFactory> {
        let config = BridgeConfig {
            max_sessions,
            ..Default::default()
        };
        DuelRegistry::new(factory, Arc::new(CardLibrary::new()), config)
    }

    #[test]
    fn test_create_and_destroy() {
        let factory = IdleFactory::default();
        let drops = Arc::clone(&factory.drops);
        let mut registry = registry(factory, 4);

        let handle = registry.create(&DuelOptions::default()).unwrap();
        assert_ne!(handle.as_raw(), 0);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.advance(handle).unwrap(), DuelStatus::Ended);

        registry.destroy(handle);
        registry.destroy(handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1, "engine released exactly once");
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut registry = registry(IdleFactory::default(), 4);
        let handle = registry.create(&DuelOptions::default()).unwrap();
        registry.destroy(handle);

        let card = NewCard {
            team: 0,
            duelist: 0,
            code: 1,
            controller: 0,
            location: location::DECK,
            sequence: 0,
            position: 0,
        };
        let err = registry.add_card(handle, &card).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(matches!(registry.advance(handle), Err(DuelError::InvalidHandle(_))));
        assert!(registry.next_message(DuelHandle::from_raw(999)).is_err());
    }

    #[test]
    fn test_capacity_limit() {
        let mut registry = registry(IdleFactory::default(), 2);
        registry.create(&DuelOptions::default()).unwrap();
        let second = registry.create(&DuelOptions::default()).unwrap();
        assert_eq!(registry.available_slots(), 0);

        let err = registry.create(&DuelOptions::default()).unwrap_err();
        assert!(matches!(err, DuelError::ResourceExhausted(_)));

        registry.destroy(second);
        assert!(registry.create(&DuelOptions::default()).is_ok());
    }

    #[test]
    fn test_engine_failure_leaves_nothing_behind() {
        let factory = IdleFactory {
            refuse: true,
            ..Default::default()
        };
        let mut registry = registry(factory, 2);

        let err = registry.create(&DuelOptions::default()).unwrap_err();
        assert!(matches!(err, DuelError::EngineUnavailable(_)));
        assert_eq!(err.code(), duel_core::error_codes::ENGINE_UNAVAILABLE);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_handles_are_not_reused() {
        let mut registry = registry(IdleFactory::default(), 2);
        let first = registry.create(&DuelOptions::default()).unwrap();
        registry.destroy(first);
        let second = registry.create(&DuelOptions::default()).unwrap();
        assert_ne!(first, second);
    }
}
