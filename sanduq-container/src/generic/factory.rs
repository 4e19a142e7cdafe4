//! Deferred factories: `Factory<T>` and `FactoryWith<A, T>`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use super::{Assemble, Deferred, GenericResolver, GenericShape, GenericTemplate, deferred, unsupported};
use crate::container::Container;
use crate::context::ResolutionContext;
use crate::descriptor::{Dependency, Injectable, TypeDescriptor};
use crate::error::Result;
use crate::instance::{downcast, erase};
use crate::registry::Producer;

/// Creates `T` on demand.
///
/// Each call to [`create`](Factory::create) runs a fresh resolution of `T`
/// in the container the factory came from. Requesting `Factory<T>` instead
/// of `T` is the usual way to break a constructor cycle.
pub struct Factory<T: ?Sized> {
    deferred: Deferred,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Factory<T> {
    /// Resolves a new `T`.
    ///
    /// # Errors
    /// Whatever resolving `T` fails with, or
    /// [`SanduqError::ContainerDropped`](crate::error::SanduqError::ContainerDropped)
    /// once the container is gone.
    pub fn create(&self) -> Result<Arc<T>> {
        downcast::<T>(&self.deferred.invoke(Vec::new())?)
    }
}

impl<T: ?Sized> Clone for Factory<T> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Factory").field(&self.deferred.output()).finish()
    }
}

impl<T: ?Sized + Injectable> Injectable for Factory<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic::<Self>(GenericShape::new(
            GenericTemplate::Factory,
            vec![Dependency::of::<T>()],
            Assemble::Deferred(|deferred| {
                erase(Arc::new(Factory::<T> {
                    deferred,
                    _marker: PhantomData,
                }))
            }),
        ))
    }
}

/// Creates `T` on demand from a caller-supplied `A`.
///
/// The supplied value takes the place of any `A` in `T`'s dependency graph
/// for that one creation.
pub struct FactoryWith<A: ?Sized, T: ?Sized> {
    deferred: Deferred,
    _marker: PhantomData<fn(Arc<A>) -> Arc<T>>,
}

impl<A, T> FactoryWith<A, T>
where
    A: ?Sized + Send + Sync + 'static,
    T: ?Sized + Send + Sync + 'static,
{
    /// Resolves a new `T` with `argument` supplied for `A`.
    pub fn create(&self, argument: impl Into<Arc<A>>) -> Result<Arc<T>> {
        let given = vec![erase(argument.into())];
        downcast::<T>(&self.deferred.invoke(given)?)
    }
}

impl<A: ?Sized, T: ?Sized> Clone for FactoryWith<A, T> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
            _marker: PhantomData,
        }
    }
}

impl<A: ?Sized, T: ?Sized> fmt::Debug for FactoryWith<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FactoryWith").field(&self.deferred.output()).finish()
    }
}

impl<A: ?Sized + Injectable, T: ?Sized + Injectable> Injectable for FactoryWith<A, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic::<Self>(GenericShape::new(
            GenericTemplate::Factory,
            vec![Dependency::of::<A>(), Dependency::of::<T>()],
            Assemble::Deferred(|deferred| {
                erase(Arc::new(FactoryWith::<A, T> {
                    deferred,
                    _marker: PhantomData,
                }))
            }),
        ))
    }
}

/// Serves every `Factory`-template shape.
///
/// The last type argument is the output, the ones before it are values
/// supplied at call time.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredFactoryResolver;

impl GenericResolver for DeferredFactoryResolver {
    fn name(&self) -> &str {
        "deferred-factory"
    }

    fn matches(&self, shape: &GenericShape) -> bool {
        shape.template() == GenericTemplate::Factory
            && shape.arity() >= 1
            && matches!(shape.assemble(), Assemble::Deferred(_))
    }

    fn resolve(&self, shape: &GenericShape, container: &Container) -> Result<Producer> {
        let (Some((output, inputs)), Assemble::Deferred(assemble)) =
            (shape.arguments().split_last(), shape.assemble())
        else {
            return Err(unsupported(shape));
        };

        trace!(output = %output.key(), inputs = inputs.len(), "Synthesizing deferred factory");
        let deferred = deferred(
            container,
            inputs.iter().map(Dependency::key).collect(),
            *output,
        );
        Ok(Arc::new(move |_: &mut ResolutionContext| Ok(assemble(deferred.clone()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SanduqError;
    use crate::generic::Lazy;

    struct Greeting(String);

    impl Injectable for Greeting {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::builder::<Self>()
                .constructor(vec![Dependency::of::<String>()], |arguments| {
                    Ok(Greeting(format!("hello {}", arguments.take::<String>()?)))
                })
                .build()
        }
    }

    #[test]
    fn resolver_matches_factory_shapes_only() {
        let resolver = DeferredFactoryResolver;
        assert!(resolver.matches(&shape_of::<Factory<Greeting>>()));
        assert!(resolver.matches(&shape_of::<FactoryWith<String, Greeting>>()));
        assert!(!resolver.matches(&shape_of::<Lazy<Greeting>>()));
    }

    fn shape_of<T: Injectable>() -> GenericShape {
        match T::descriptor().kind() {
            crate::descriptor::TypeKind::Generic(shape) => shape.clone(),
            _ => panic!("not a generic type"),
        }
    }

    #[test]
    fn factory_creates_fresh_values() {
        let container = Container::new();
        container.register_value(String::from("world")).unwrap();

        let factory = container.resolve::<Factory<Greeting>>().unwrap();
        let a = factory.create().unwrap();
        let b = factory.create().unwrap();

        assert_eq!(a.0, "hello world");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn supplied_argument_reaches_the_constructor() {
        let container = Container::new();
        let factory = container
            .resolve::<FactoryWith<String, Greeting>>()
            .unwrap();

        assert_eq!(factory.create("there".to_string()).unwrap().0, "hello there");
        assert_eq!(factory.create(Arc::new("you".to_string())).unwrap().0, "hello you");
    }

    #[test]
    fn factory_outliving_its_container_fails() {
        let container = Container::new();
        container.register_value(String::from("world")).unwrap();
        let factory = container.resolve::<Factory<Greeting>>().unwrap();
        drop(container);

        assert!(matches!(
            factory.create(),
            Err(SanduqError::ContainerDropped { .. })
        ));
    }
}
