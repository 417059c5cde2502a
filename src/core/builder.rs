use std::sync::Arc;

use crate::{
    clock::Clock,
    config::Config,
    remote::Fetcher,
    store::{ConfigStore, MemoryStore, Settings},
    subscribers::{Presenter, PresenterSet},
    transport::{Bus, Endpoint},
};

use super::context::{self, ContextHandle, Wiring};

/// Builder for one execution context attached to a [`Bus`].
///
/// Only the fetcher is mandatory. Unless configured otherwise the context
/// keeps its config in a private [`MemoryStore`], has no settings source,
/// no presenters, and reads the system clock.
pub struct ContextBuilder {
    endpoint: Endpoint,
    fetcher: Arc<dyn Fetcher>,
    config: Config,
    store: Option<Arc<dyn ConfigStore>>,
    settings: Option<Arc<dyn Settings>>,
    presenters: Vec<Arc<dyn Presenter>>,
    clock: Option<Clock>,
}

impl ContextBuilder {
    /// Creates a builder for a new context on `bus`.
    pub fn new(bus: &Bus, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            endpoint: bus.endpoint(),
            fetcher,
            config: Config::default(),
            store: None,
            settings: None,
            presenters: Vec::new(),
            clock: None,
        }
    }

    /// Sets tuning knobs.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the durable store. Contexts of one process should share it.
    pub fn with_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the settings collaborator consulted at boot and on reload.
    pub fn with_settings(mut self, settings: Arc<dyn Settings>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets presenters.
    ///
    /// Each presenter receives events through its own bounded queue and
    /// worker, so a slow presenter never stalls the context.
    pub fn with_presenters(mut self, presenters: Vec<Arc<dyn Presenter>>) -> Self {
        self.presenters = presenters;
        self
    }

    /// Anchors wall time (tests and replays).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Spawns the context onto the current tokio runtime.
    ///
    /// The context subscribes to the bus before this returns, so messages
    /// published afterwards are never missed.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self) -> ContextHandle {
        let presenters = PresenterSet::new(self.presenters, self.config.presenter_queue);
        context::spawn(Wiring {
            endpoint: self.endpoint,
            config: self.config,
            clock: self.clock.unwrap_or_default(),
            fetcher: self.fetcher,
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            settings: self.settings,
            presenters,
        })
    }
}
