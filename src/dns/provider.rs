//! Registration point for the active resolver factory.
//!
//! A [`ResolverProvider`] is handed to the session builder instead of living in
//! a process-wide global. Clones share one slot, so a test can keep a handle,
//! swap the factory, and build further sessions from the same provider.

use super::{GaiResolverFactory, Resolve, ResolverFactory};
use crate::config::ResolutionConfig;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Slot {
    factory: RwLock<Arc<dyn ResolverFactory>>,
    created: AtomicUsize,
}

/// Holds the single active [`ResolverFactory`].
///
/// Replacing the factory only affects resolvers created afterwards. A session
/// that already built its resolver keeps it; there is no hot swap.
#[derive(Clone)]
pub struct ResolverProvider {
    slot: Arc<Slot>,
}

impl Default for ResolverProvider {
    fn default() -> Self {
        Self::new(GaiResolverFactory)
    }
}

impl ResolverProvider {
    pub fn new(factory: impl ResolverFactory + 'static) -> Self {
        Self::from_arc(Arc::new(factory))
    }

    pub fn from_arc(factory: Arc<dyn ResolverFactory>) -> Self {
        Self {
            slot: Arc::new(Slot {
                factory: RwLock::new(factory),
                created: AtomicUsize::new(0),
            }),
        }
    }

    /// Installs `factory` for every resolver created from now on.
    ///
    /// Callers are expected to do this before the first session starts.
    /// Swapping later is not an error; resolvers already handed out keep
    /// their behavior.
    pub fn set_default_resolver_factory(&self, factory: impl ResolverFactory + 'static) {
        let factory: Arc<dyn ResolverFactory> = Arc::new(factory);
        let created = self.slot.created.load(Ordering::Acquire);
        if created > 0 {
            tracing::warn!(
                live_resolvers = created,
                factory = ?factory,
                "resolver factory replaced after resolvers were created; existing resolvers are unaffected"
            );
        } else {
            tracing::debug!(factory = ?factory, "resolver factory installed");
        }
        *self.slot.factory.write() = factory;
    }

    /// The currently installed factory.
    pub fn factory(&self) -> Arc<dyn ResolverFactory> {
        Arc::clone(&self.slot.factory.read())
    }

    /// Builds a resolver from the currently installed factory.
    pub fn create_resolver(&self, config: &ResolutionConfig) -> Arc<dyn Resolve> {
        let factory = self.factory();
        self.slot.created.fetch_add(1, Ordering::AcqRel);
        factory.create(config)
    }

    /// Number of resolvers handed out so far.
    pub fn created_count(&self) -> usize {
        self.slot.created.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ResolverProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverProvider")
            .field("factory", &*self.slot.factory.read())
            .field("created", &self.created_count())
            .finish()
    }
}
