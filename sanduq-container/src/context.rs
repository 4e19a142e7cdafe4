//! Per-resolution state.
//!
//! A [`ResolutionContext`] lives for one top-level resolution (or one
//! invocation of a deferred factory). It records the chain of types under
//! construction, which is how cycles are caught, and carries values handed
//! to a deferred factory so constructor parameters can pick them up.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::container::Container;
use crate::descriptor::{Dependency, Injectable};
use crate::error::{CircularDependencyError, Result, SanduqError};
use crate::instance::{Instance, downcast};
use crate::key::ServiceKey;

/// State of one resolution.
///
/// Producers receive it and use it to resolve their own dependencies.
pub struct ResolutionContext {
    container: Container,
    chain: Vec<ServiceKey>,
    given: HashMap<ServiceKey, Instance>,
}

impl ResolutionContext {
    pub(crate) fn new(container: &Container) -> Self {
        Self {
            container: container.clone(),
            chain: Vec::new(),
            given: HashMap::new(),
        }
    }

    /// The container the resolution started from.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Types currently under construction, outermost first.
    pub fn chain(&self) -> &[ServiceKey] {
        &self.chain
    }

    /// The type whose construction is asking for a dependency, if any.
    pub fn requester(&self) -> Option<ServiceKey> {
        self.chain.last().copied()
    }

    /// A value handed to the running deferred factory for `key`, if any.
    pub fn supplied(&self, key: &ServiceKey) -> Option<&Instance> {
        self.given.get(key)
    }

    pub(crate) fn supply(&mut self, key: ServiceKey, instance: Instance) {
        self.given.insert(key, instance);
    }

    /// Resolves `T` in this context.
    pub fn resolve<T: ?Sized + Injectable>(&mut self) -> Result<Arc<T>> {
        let instance = self.resolve_dependency(&Dependency::of::<T>())?;
        downcast::<T>(&instance)
    }

    /// Resolves a dependency in this context.
    ///
    /// Values supplied to a deferred factory take precedence over
    /// everything the container knows.
    pub fn resolve_dependency(&mut self, dependency: &Dependency) -> Result<Instance> {
        let key = dependency.key();
        if let Some(instance) = self.given.get(&key) {
            trace!(key = %key, "Using supplied argument");
            return Ok(instance.clone());
        }

        let container = self.container.clone();
        let producer = container.producer_for(dependency, self.requester())?;
        producer(self)
    }

    /// Runs `body` with `key` pushed on the chain.
    ///
    /// # Errors
    /// [`SanduqError::CircularDependency`] if `key` is already being built.
    pub(crate) fn within<R>(
        &mut self,
        key: ServiceKey,
        body: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.enter(key)?;
        let outcome = body(self);
        self.chain.pop();
        outcome
    }

    fn enter(&mut self, key: ServiceKey) -> Result<()> {
        if let Some(start) = self.chain.iter().position(|k| *k == key) {
            let mut cycle = self.chain[start..].to_vec();
            cycle.push(key);
            warn!(key = %key, depth = self.chain.len(), "Circular dependency detected");
            return Err(SanduqError::CircularDependency(CircularDependencyError {
                chain: cycle,
            }));
        }
        self.chain.push(key);
        Ok(())
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("chain", &self.chain)
            .field("supplied", &self.given.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::erase;

    struct Invoice;
    struct Ledger;

    #[test]
    fn within_pushes_and_pops() {
        let container = Container::new();
        let mut ctx = ResolutionContext::new(&container);

        let depth = ctx
            .within(ServiceKey::of::<Invoice>(), |ctx| {
                assert_eq!(ctx.requester(), Some(ServiceKey::of::<Invoice>()));
                Ok(ctx.chain().len())
            })
            .unwrap();

        assert_eq!(depth, 1);
        assert!(ctx.chain().is_empty());
    }

    #[test]
    fn reentering_reports_the_cycle() {
        let container = Container::new();
        let mut ctx = ResolutionContext::new(&container);

        let result = ctx.within(ServiceKey::of::<Invoice>(), |ctx| {
            ctx.within(ServiceKey::of::<Ledger>(), |ctx| {
                ctx.within(ServiceKey::of::<Invoice>(), |_| Ok(()))
            })
        });

        match result {
            Err(SanduqError::CircularDependency(e)) => {
                assert_eq!(
                    e.chain,
                    vec![
                        ServiceKey::of::<Invoice>(),
                        ServiceKey::of::<Ledger>(),
                        ServiceKey::of::<Invoice>(),
                    ]
                );
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
        assert!(ctx.chain().is_empty());
    }

    #[test]
    fn chain_is_restored_after_failure() {
        let container = Container::new();
        let mut ctx = ResolutionContext::new(&container);

        let result: Result<()> = ctx.within(ServiceKey::of::<Invoice>(), |_| {
            Err(SanduqError::construction(ServiceKey::of::<Invoice>(), "boom"))
        });

        assert!(result.is_err());
        assert!(ctx.chain().is_empty());
    }

    #[test]
    fn supplied_values_win() {
        let container = Container::new();
        container.register_value(5u32).unwrap();

        let mut ctx = ResolutionContext::new(&container);
        ctx.supply(ServiceKey::of::<u32>(), erase(Arc::new(9u32)));

        assert_eq!(*ctx.resolve::<u32>().unwrap(), 9);
        assert!(ctx.supplied(&ServiceKey::of::<u32>()).is_some());
    }
}
