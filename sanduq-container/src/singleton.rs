//! Singleton producers.
//!
//! A singleton wraps another producer and caches its first successful
//! result in a `OnceCell`. A failed creation leaves the cell empty so a
//! later resolution can try again.

use std::sync::Arc;
use std::thread::{self, ThreadId};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::container::WeakContainer;
use crate::context::ResolutionContext;
use crate::error::{CircularDependencyError, Result, SanduqError};
use crate::instance::{Disposer, Instance};
use crate::key::ServiceKey;
use crate::registry::Producer;

struct SingletonCell {
    key: ServiceKey,
    value: OnceCell<Instance>,
    creator: Mutex<Option<ThreadId>>,
    disposer: Option<Disposer>,
    owner: WeakContainer,
}

impl SingletonCell {
    fn get_or_create(&self, ctx: &mut ResolutionContext, producer: &Producer) -> Result<Instance> {
        if let Some(instance) = self.value.get() {
            return Ok(instance.clone());
        }

        // Other threads block in the cell until creation finishes; the
        // creating thread itself must not, or it would wait on itself.
        let current = thread::current().id();
        if *self.creator.lock() == Some(current) {
            let mut chain = ctx.chain().to_vec();
            chain.push(self.key);
            warn!(key = %self.key, "Singleton requested while being created");
            return Err(SanduqError::CircularDependency(CircularDependencyError { chain }));
        }

        let mut created = false;
        let instance = self.value.get_or_try_init(|| {
            *self.creator.lock() = Some(current);
            let produced = producer(ctx);
            *self.creator.lock() = None;
            created = produced.is_ok();
            produced
        })?;

        if created {
            trace!(key = %self.key, "Singleton created");
            self.track(instance);
        }
        Ok(instance.clone())
    }

    fn track(&self, instance: &Instance) {
        let Some(disposer) = &self.disposer else {
            return;
        };
        if let (Some(service), Some(owner)) = (disposer(instance), self.owner.upgrade()) {
            owner.track(service);
        }
    }
}

/// Wraps `producer` so it runs at most once successfully.
///
/// The created instance is handed to `owner` for disposal when `disposer`
/// is given.
pub(crate) fn share(
    key: ServiceKey,
    producer: Producer,
    disposer: Option<Disposer>,
    owner: WeakContainer,
) -> Producer {
    let cell = SingletonCell {
        key,
        value: OnceCell::new(),
        creator: Mutex::new(None),
        disposer,
        owner,
    };
    Arc::new(move |ctx: &mut ResolutionContext| cell.get_or_create(ctx, &producer))
}

/// A producer that always returns `instance`.
pub(crate) fn constant(instance: Instance) -> Producer {
    Arc::new(move |_: &mut ResolutionContext| Ok(instance.clone()))
}
