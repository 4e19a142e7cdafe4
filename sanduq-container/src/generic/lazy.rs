//! `Lazy<T>`: a value resolved on first access.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::{Assemble, Deferred, GenericResolver, GenericShape, GenericTemplate, deferred, unsupported};
use crate::container::Container;
use crate::context::ResolutionContext;
use crate::descriptor::{Dependency, Injectable, TypeDescriptor};
use crate::error::Result;
use crate::instance::{downcast, erase};
use crate::registry::Producer;

/// A `T` resolved the first time [`get`](Lazy::get) is called, then kept.
///
/// A failed resolution is not kept; the next `get` tries again.
pub struct Lazy<T: ?Sized> {
    deferred: Deferred,
    value: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Lazy<T> {
    pub fn get(&self) -> Result<Arc<T>> {
        self.value
            .get_or_try_init(|| downcast::<T>(&self.deferred.invoke(Vec::new())?))
            .cloned()
    }

    /// Whether the value was already resolved.
    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<T: ?Sized> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("output", &self.deferred.output())
            .field("initialized", &self.value.get().is_some())
            .finish()
    }
}

impl<T: ?Sized + Injectable> Injectable for Lazy<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic::<Self>(GenericShape::new(
            GenericTemplate::Lazy,
            vec![Dependency::of::<T>()],
            Assemble::Deferred(|deferred| {
                erase(Arc::new(Lazy::<T> {
                    deferred,
                    value: OnceCell::new(),
                }))
            }),
        ))
    }
}

/// Serves `Lazy<T>` through the deferred factory machinery.
#[derive(Debug, Default, Clone, Copy)]
pub struct LazyResolver;

impl GenericResolver for LazyResolver {
    fn name(&self) -> &str {
        "lazy"
    }

    fn matches(&self, shape: &GenericShape) -> bool {
        shape.template() == GenericTemplate::Lazy
            && shape.arity() == 1
            && matches!(shape.assemble(), Assemble::Deferred(_))
    }

    fn resolve(&self, shape: &GenericShape, container: &Container) -> Result<Producer> {
        let (Some(target), Assemble::Deferred(assemble)) = (shape.arguments().first(), shape.assemble())
        else {
            return Err(unsupported(shape));
        };

        let deferred = deferred(container, Vec::new(), *target);
        Ok(Arc::new(move |_: &mut ResolutionContext| Ok(assemble(deferred.clone()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SanduqError;
    use std::sync::atomic::{AtomicU32, Ordering};

    static BUILT: AtomicU32 = AtomicU32::new(0);

    struct Expensive;

    impl Injectable for Expensive {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::builder::<Self>()
                .constructor(vec![], |_| {
                    BUILT.fetch_add(1, Ordering::SeqCst);
                    Ok(Expensive)
                })
                .build()
        }
    }

    #[test]
    fn resolves_on_first_access_only() {
        let container = Container::new();
        let lazy = container.resolve::<Lazy<Expensive>>().unwrap();

        assert!(!lazy.is_initialized());
        assert_eq!(BUILT.load(Ordering::SeqCst), 0);

        let first = lazy.get().unwrap();
        let second = lazy.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(lazy.is_initialized());
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_resolution_surfaces_on_get() {
        trait Missing: Send + Sync {}
        impl Injectable for dyn Missing {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::contract::<dyn Missing>()
            }
        }

        let container = Container::new();
        let lazy = container.resolve::<Lazy<dyn Missing>>().unwrap();
        assert!(matches!(
            lazy.get(),
            Err(SanduqError::NoImplementationGiven(_))
        ));
        assert!(!lazy.is_initialized());
    }
}
