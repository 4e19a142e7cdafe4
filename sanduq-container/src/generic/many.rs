//! `Many<T>`: every binding registered for `T`.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::{Assemble, GenericResolver, GenericShape, GenericTemplate, unsupported};
use crate::container::Container;
use crate::context::ResolutionContext;
use crate::descriptor::{Dependency, Injectable, TypeDescriptor};
use crate::error::Result;
use crate::instance::{Instance, downcast, erase};
use crate::registry::Producer;

/// All registered bindings of `T`, resolved.
///
/// Ordered by registration: the requesting container's own bindings first,
/// then those of added containers, depth-first in the order they were
/// added. Types built implicitly are not included.
pub struct Many<T: ?Sized> {
    items: Vec<Arc<T>>,
}

impl<T: ?Sized> Many<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.items.iter()
    }

    /// The resolved values as a slice.
    pub fn as_slice(&self) -> &[Arc<T>] {
        &self.items
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a Many<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: ?Sized> fmt::Debug for Many<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Many").field("len", &self.items.len()).finish()
    }
}

impl<T: ?Sized + Injectable> Injectable for Many<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::generic::<Self>(GenericShape::new(
            GenericTemplate::Many,
            vec![Dependency::of::<T>()],
            Assemble::Collection(|values| {
                let items = values.iter().map(downcast::<T>).collect::<Result<Vec<_>>>()?;
                Ok(erase(Arc::new(Many { items })))
            }),
        ))
    }
}

/// Serves `Many<T>` from the multi-binding sets of the container graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManyResolver;

impl GenericResolver for ManyResolver {
    fn name(&self) -> &str {
        "many"
    }

    fn matches(&self, shape: &GenericShape) -> bool {
        shape.template() == GenericTemplate::Many
            && shape.arity() == 1
            && matches!(shape.assemble(), Assemble::Collection(_))
    }

    fn resolve(&self, shape: &GenericShape, _container: &Container) -> Result<Producer> {
        let (Some(element), Assemble::Collection(assemble)) = (shape.arguments().first(), shape.assemble())
        else {
            return Err(unsupported(shape));
        };

        let key = element.key();
        Ok(Arc::new(move |ctx: &mut ResolutionContext| {
            // Gathered now, so bindings added after the request are seen.
            let producers = ctx.container().collect_bindings(&key);
            trace!(key = %key, count = producers.len(), "Resolving all bindings");

            let mut values: Vec<Instance> = Vec::with_capacity(producers.len());
            for producer in &producers {
                values.push(producer(ctx)?);
            }
            assemble(values)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Plugin: Send + Sync {
        fn name(&self) -> &'static str;
    }

    impl Injectable for dyn Plugin {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::contract::<dyn Plugin>()
        }
    }

    struct Named(&'static str);
    impl Plugin for Named {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    fn plugin(name: &'static str) -> Arc<dyn Plugin> {
        Arc::new(Named(name))
    }

    #[test]
    fn empty_when_nothing_is_bound() {
        let container = Container::new();
        let all = container.resolve::<Many<dyn Plugin>>().unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn own_bindings_first_then_added_containers() {
        let shared = Container::new();
        shared.register_instance(plugin("shared")).unwrap();

        let container = Container::new();
        container.register_instance(plugin("first")).unwrap();
        container.register_instance(plugin("second")).unwrap();
        container.add_container(&shared);

        let all = container.resolve::<Many<dyn Plugin>>().unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["first", "second", "shared"]);
    }

    #[test]
    fn bindings_added_later_are_seen_by_new_requests() {
        let container = Container::new();
        container.register_instance(plugin("early")).unwrap();
        assert_eq!(container.resolve::<Many<dyn Plugin>>().unwrap().len(), 1);

        container.register_instance(plugin("late")).unwrap();
        let all = container.resolve::<Many<dyn Plugin>>().unwrap();
        let names: Vec<_> = (&*all).into_iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["early", "late"]);
    }
}
