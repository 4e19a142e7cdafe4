//! Producer registry: the bindings owned by one container.
//!
//! Maps a [`ServiceKey`] to the [`Producer`] that yields its instances.
//! Explicit registrations accumulate: the first one is the single-resolve
//! binding, further ones make the key ambiguous for single resolution while
//! all of them stay visible to `Many<T>`.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, trace, warn};

use crate::context::ResolutionContext;
use crate::error::{
    DuplicateRegistrationError, MultipleTypesRegisteredError, Result, SanduqError,
};
use crate::instance::Instance;
use crate::key::ServiceKey;

/// Type alias for producers.
///
/// A producer receives the [`ResolutionContext`] of the running resolution
/// (to resolve its own dependencies) and returns an erased instance.
///
/// `Arc` because producers are shared by containers, generic resolvers and
/// other producers across threads.
pub type Producer = Arc<dyn Fn(&mut ResolutionContext) -> Result<Instance> + Send + Sync>;

/// How a key got its binding.
#[derive(Clone)]
enum Binding {
    /// Registered by the user. Eligible for accumulation.
    Explicit(Producer),
    /// Built from the type's constructor, on request or through `register_type`.
    Constructed(Producer),
    /// Several explicit bindings. Single resolution is refused.
    Ambiguous(usize),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Explicit(_) => f.write_str("Explicit"),
            Binding::Constructed(_) => f.write_str("Constructed"),
            Binding::Ambiguous(count) => write!(f, "Ambiguous({count})"),
        }
    }
}

/// Stores the bindings of one container.
///
/// Lookups and insertions are lock-free from the caller's point of view.
/// Producers are always cloned out before they run, no map guard is held
/// while user code executes.
pub(crate) struct Registry {
    bindings: DashMap<ServiceKey, Binding>,
    multi: DashMap<ServiceKey, Vec<Producer>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
            multi: DashMap::new(),
        }
    }

    /// Looks up the single-resolve producer for `key`.
    ///
    /// # Errors
    /// [`SanduqError::MultipleTypesRegistered`] if several explicit bindings
    /// exist for `key`.
    pub fn lookup(&self, key: &ServiceKey) -> Result<Option<Producer>> {
        let binding = match self.bindings.get(key) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };

        match binding {
            Binding::Explicit(producer) | Binding::Constructed(producer) => {
                trace!(key = %key, "Found binding");
                Ok(Some(producer))
            }
            Binding::Ambiguous(count) => {
                warn!(key = %key, count, "Ambiguous single resolution");
                Err(SanduqError::MultipleTypesRegistered(
                    MultipleTypesRegisteredError { key: *key, count },
                ))
            }
        }
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Adds an explicit binding and returns how many `key` now has.
    ///
    /// # Errors
    /// [`SanduqError::DuplicateRegistration`] if `key` was already built
    /// through its constructor.
    pub fn register_explicit(&self, key: ServiceKey, producer: Producer) -> Result<usize> {
        let count = match self.bindings.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Binding::Explicit(producer.clone()));
                1
            }
            Entry::Occupied(mut slot) => {
                let count = match slot.get() {
                    Binding::Constructed(_) => return Err(duplicate(key)),
                    Binding::Explicit(_) => 2,
                    Binding::Ambiguous(count) => count + 1,
                };
                slot.insert(Binding::Ambiguous(count));
                count
            }
        };

        self.multi.entry(key).or_default().push(producer);
        debug!(key = %key, bindings = count, "Registered binding");
        Ok(count)
    }

    /// Stores a constructor-built binding, refusing any existing one.
    ///
    /// `register_type` goes through here; the binding is also visible to
    /// `Many<T>`.
    pub fn register_constructed(&self, key: ServiceKey, producer: Producer) -> Result<()> {
        match self.bindings.entry(key) {
            Entry::Occupied(_) => return Err(duplicate(key)),
            Entry::Vacant(slot) => {
                slot.insert(Binding::Constructed(producer.clone()));
            }
        }
        self.multi.entry(key).or_default().push(producer);
        debug!(key = %key, "Registered type");
        Ok(())
    }

    /// Caches a producer built during resolution.
    ///
    /// When another thread cached one first, that one wins and is returned.
    /// Implicitly built producers are not added to the `Many<T>` set.
    ///
    /// # Errors
    /// [`SanduqError::MultipleTypesRegistered`] if the key became ambiguous
    /// in the meantime.
    pub fn constructed_or_existing(&self, key: ServiceKey, producer: Producer) -> Result<Producer> {
        let existing = match self.bindings.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Binding::Constructed(producer.clone()));
                trace!(key = %key, "Cached constructed producer");
                return Ok(producer);
            }
            Entry::Occupied(slot) => slot.get().clone(),
        };

        match existing {
            Binding::Explicit(producer) | Binding::Constructed(producer) => Ok(producer),
            Binding::Ambiguous(count) => Err(SanduqError::MultipleTypesRegistered(
                MultipleTypesRegisteredError { key, count },
            )),
        }
    }

    /// Seeds a binding on a fresh registry. Used for self-registration.
    pub fn seed(&self, key: ServiceKey, producer: Producer) {
        self.bindings.insert(key, Binding::Explicit(producer.clone()));
        self.multi.insert(key, vec![producer]);
    }

    /// All producers registered for `key`, in registration order.
    pub fn multi_bindings(&self, key: &ServiceKey) -> Vec<Producer> {
        self.multi
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the number of bound keys.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns every bound key.
    pub fn registered_keys(&self) -> Vec<ServiceKey> {
        self.bindings.iter().map(|entry| *entry.key()).collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("bindings", &self.bindings.len())
            .field("multi", &self.multi.len())
            .finish()
    }
}

fn duplicate(key: ServiceKey) -> SanduqError {
    SanduqError::DuplicateRegistration(DuplicateRegistrationError { key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::erase;

    struct Database;

    fn constant(value: u32) -> Producer {
        Arc::new(move |_: &mut ResolutionContext| Ok(erase(Arc::new(value))))
    }

    #[test]
    fn register_and_lookup() {
        let registry = Registry::new();
        let key = ServiceKey::of::<Database>();
        assert_eq!(registry.register_explicit(key, constant(1)).unwrap(), 1);
        assert!(registry.lookup(&key).unwrap().is_some());
        assert!(registry.contains(&key));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_explicit_binding_is_ambiguous() {
        let registry = Registry::new();
        let key = ServiceKey::of::<Database>();
        registry.register_explicit(key, constant(1)).unwrap();
        assert_eq!(registry.register_explicit(key, constant(2)).unwrap(), 2);
        assert_eq!(registry.register_explicit(key, constant(3)).unwrap(), 3);

        match registry.lookup(&key) {
            Err(SanduqError::MultipleTypesRegistered(e)) => assert_eq!(e.count, 3),
            other => panic!("Expected MultipleTypesRegistered, got: {:?}", other.map(|p| p.is_some())),
        }
        assert_eq!(registry.multi_bindings(&key).len(), 3);
    }

    #[test]
    fn explicit_over_constructed_is_duplicate() {
        let registry = Registry::new();
        let key = ServiceKey::of::<Database>();
        registry.constructed_or_existing(key, constant(1)).unwrap();

        let err = registry.register_explicit(key, constant(2)).unwrap_err();
        assert!(matches!(err, SanduqError::DuplicateRegistration(_)));
    }

    #[test]
    fn constructed_refuses_existing() {
        let registry = Registry::new();
        let key = ServiceKey::of::<Database>();
        registry.register_explicit(key, constant(1)).unwrap();

        let err = registry.register_constructed(key, constant(2)).unwrap_err();
        assert!(matches!(err, SanduqError::DuplicateRegistration(_)));
    }

    #[test]
    fn implicit_constructions_are_not_multi_bound() {
        let registry = Registry::new();
        let key = ServiceKey::of::<Database>();
        let first = registry.constructed_or_existing(key, constant(1)).unwrap();
        let second = registry.constructed_or_existing(key, constant(2)).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.multi_bindings(&key).is_empty());
    }

    #[test]
    fn registered_types_are_multi_bound() {
        let registry = Registry::new();
        let key = ServiceKey::of::<Database>();
        registry.register_constructed(key, constant(1)).unwrap();
        assert_eq!(registry.multi_bindings(&key).len(), 1);
    }

    #[test]
    fn registered_keys_lists_everything() {
        let registry = Registry::new();
        registry.register_explicit(ServiceKey::of::<Database>(), constant(1)).unwrap();
        registry.seed(ServiceKey::of::<String>(), constant(2));

        let keys = registry.registered_keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&ServiceKey::of::<String>()));
        assert!(!registry.is_empty());
    }
}
