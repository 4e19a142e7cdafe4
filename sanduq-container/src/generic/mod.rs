//! Generic request types and their resolvers.
//!
//! Some requests are not for a service but for a *way to get* services:
//! `Factory<T>`, `FactoryWith<A, T>`, `Lazy<T>` and `Many<T>`. Their
//! descriptors carry a [`GenericShape`] and the container asks its
//! [`GenericResolver`]s, in order, to synthesise a producer for them.
//! Synthesised producers are not cached, each request gets a fresh one.
//!
//! Custom generic types plug in by describing themselves with a
//! [`GenericTemplate::Custom`] template and installing a resolver through
//! [`ContainerBuilder::generic_resolver`](crate::container::ContainerBuilder::generic_resolver).

mod factory;
mod lazy;
mod many;

use std::fmt;
use std::sync::Arc;

pub use factory::{DeferredFactoryResolver, Factory, FactoryWith};
pub use lazy::{Lazy, LazyResolver};
pub use many::{Many, ManyResolver};

use crate::container::Container;
use crate::context::ResolutionContext;
use crate::descriptor::Dependency;
use crate::error::{NoSuitableConstructorError, Result, SanduqError};
use crate::instance::Instance;
use crate::key::ServiceKey;
use crate::registry::Producer;

/// The generic type a request instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericTemplate {
    Factory,
    Lazy,
    Many,
    /// A user-defined generic type, matched by name.
    Custom(&'static str),
}

/// Turns what a resolver produced into the requested generic value.
#[derive(Clone, Copy)]
pub enum Assemble {
    /// Wraps a deferred factory (`Factory`, `FactoryWith`, `Lazy`).
    Deferred(fn(Deferred) -> Instance),
    /// Wraps resolved instances (`Many`).
    Collection(fn(Vec<Instance>) -> Result<Instance>),
}

impl fmt::Debug for Assemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assemble::Deferred(_) => f.write_str("Deferred"),
            Assemble::Collection(_) => f.write_str("Collection"),
        }
    }
}

/// The shape of a generic instantiation: which template, with which
/// type arguments, and how to assemble the final value.
#[derive(Debug, Clone)]
pub struct GenericShape {
    template: GenericTemplate,
    arguments: Vec<Dependency>,
    assemble: Assemble,
}

impl GenericShape {
    pub fn new(template: GenericTemplate, arguments: Vec<Dependency>, assemble: Assemble) -> Self {
        Self {
            template,
            arguments,
            assemble,
        }
    }

    #[inline]
    pub fn template(&self) -> GenericTemplate {
        self.template
    }

    /// Type arguments, in declaration order.
    #[inline]
    pub fn arguments(&self) -> &[Dependency] {
        &self.arguments
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    #[inline]
    pub fn assemble(&self) -> Assemble {
        self.assemble
    }
}

type Call = Arc<dyn Fn(Vec<Instance>) -> Result<Instance> + Send + Sync>;

/// A resolution postponed until someone asks for the value.
///
/// Holds only a weak reference to its container.
#[derive(Clone)]
pub struct Deferred {
    output: ServiceKey,
    inputs: usize,
    call: Call,
}

impl Deferred {
    /// Wraps a call producing `output` from `inputs` supplied values.
    pub fn new<F>(output: ServiceKey, inputs: usize, call: F) -> Self
    where
        F: Fn(Vec<Instance>) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            output,
            inputs,
            call: Arc::new(call),
        }
    }

    /// The type this deferred resolution yields.
    #[inline]
    pub fn output(&self) -> ServiceKey {
        self.output
    }

    /// Runs the resolution with `given` supplied to the dependency graph.
    ///
    /// # Errors
    /// [`SanduqError::ConstructionFailed`] when the number of supplied
    /// values does not match, or whatever resolving the output fails with.
    pub fn invoke(&self, given: Vec<Instance>) -> Result<Instance> {
        if given.len() != self.inputs {
            return Err(SanduqError::construction(
                self.output,
                format!("Expected {} supplied values, got {}", self.inputs, given.len()),
            ));
        }
        (self.call)(given)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("output", &self.output)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Synthesises producers for generic request types.
///
/// A container consults its resolvers in installation order and uses the
/// first whose [`matches`](GenericResolver::matches) accepts the shape.
pub trait GenericResolver: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether this resolver handles `shape`.
    fn matches(&self, shape: &GenericShape) -> bool;

    /// Builds a producer for `shape` on `container`.
    fn resolve(&self, shape: &GenericShape, container: &Container) -> Result<Producer>;
}

/// The built-in resolvers, in the order they are consulted.
pub(crate) fn default_resolvers() -> Vec<Arc<dyn GenericResolver>> {
    vec![
        Arc::new(DeferredFactoryResolver),
        Arc::new(ManyResolver),
        Arc::new(LazyResolver),
    ]
}

/// Builds a [`Deferred`] resolving `output` from `container`, with values
/// supplied for `inputs`.
///
/// Every invocation uses a fresh resolution context, so types built earlier
/// in the requesting chain are not visible to it.
pub(crate) fn deferred(container: &Container, inputs: Vec<ServiceKey>, output: Dependency) -> Deferred {
    let weak = container.downgrade();
    let arity = inputs.len();
    Deferred::new(output.key(), arity, move |given: Vec<Instance>| {
        let container = weak.upgrade().ok_or(SanduqError::ContainerDropped { key: output.key() })?;
        let mut ctx = ResolutionContext::new(&container);
        for (key, value) in inputs.iter().zip(given) {
            ctx.supply(*key, value);
        }
        let producer = container.producer_for(&output, None)?;
        producer(&mut ctx)
    })
}

/// Error for a shape a resolver accepted but cannot serve.
pub(crate) fn unsupported(shape: &GenericShape) -> SanduqError {
    SanduqError::NoSuitableConstructor(NoSuitableConstructorError {
        requested: shape
            .arguments()
            .last()
            .map(Dependency::key)
            .unwrap_or_else(ServiceKey::of::<()>),
        constructors: 0,
        providing: 0,
    })
}
