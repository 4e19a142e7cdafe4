//! Type descriptors.
//!
//! A container never inspects types at runtime. Everything it knows about a
//! type comes from that type's [`TypeDescriptor`], supplied through the
//! [`Injectable`] trait: its constructors and their parameters, the
//! contracts it may be bound to, whether it is a singleton, how to dispose
//! of it, and, for generic request types, their [`GenericShape`].
//!
//! Most descriptors are produced by `#[derive(Injectable)]`. Writing one by
//! hand looks like this:
//!
//! ```
//! use std::sync::Arc;
//! use sanduq_container::prelude::*;
//!
//! struct Config { url: String }
//! struct Database { config: Arc<Config> }
//!
//! impl Injectable for Config {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .constructor(vec![], |_| Ok(Config { url: "postgres://localhost".into() }))
//!             .build()
//!     }
//! }
//!
//! impl Injectable for Database {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .constructor(vec![Dependency::of::<Config>()], |arguments| {
//!                 Ok(Database { config: arguments.take()? })
//!             })
//!             .singleton(SingletonPolicy::FirstResolve)
//!             .build()
//!     }
//! }
//!
//! let container = Container::new();
//! let database = container.resolve::<Database>().unwrap();
//! assert_eq!(database.config.url, "postgres://localhost");
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Result, SanduqError};
use crate::generic::GenericShape;
use crate::instance::{Dispose, Disposer, Instance, disposer_for, downcast, erase};
use crate::key::ServiceKey;
use crate::lifecycle::SingletonPolicy;

/// A type the container can describe, and therefore resolve.
///
/// Implemented by `#[derive(Injectable)]` for structs, by hand for contracts
/// (`dyn Trait`) and for anything with unusual construction.
pub trait Injectable: Send + Sync + 'static {
    /// Returns the full description of `Self`.
    fn descriptor() -> TypeDescriptor;
}

/// Converts an instance of the implementation into an instance of a contract.
pub(crate) type Caster = Arc<dyn Fn(Instance) -> Result<Instance> + Send + Sync>;

type Build = Arc<dyn Fn(&mut Arguments) -> Result<Instance> + Send + Sync>;

/// A request for a type, as seen in constructor parameters and generic
/// arguments.
///
/// Carries the key together with a way to describe the type, so the
/// container can build types nobody registered.
#[derive(Clone, Copy)]
pub struct Dependency {
    key: ServiceKey,
    describe: fn() -> TypeDescriptor,
}

impl Dependency {
    /// Creates a dependency on `T`.
    #[inline]
    pub fn of<T: ?Sized + Injectable>() -> Self {
        Self {
            key: ServiceKey::of::<T>(),
            describe: T::descriptor,
        }
    }

    #[inline]
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Produces the descriptor of the requested type.
    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency({})", self.key.type_name())
    }
}

/// What kind of type a descriptor stands for.
#[derive(Clone)]
pub enum TypeKind {
    /// A buildable type with zero or more constructors.
    Concrete(Vec<Constructor>),
    /// An abstract contract, usually a `dyn Trait`. Never built directly.
    Contract,
    /// An instantiation of a generic request type such as `Factory<T>`.
    Generic(GenericShape),
}

/// One way to build a type.
#[derive(Clone)]
pub struct Constructor {
    parameters: Vec<Dependency>,
    providing: bool,
    build: Build,
}

impl Constructor {
    /// Dependencies resolved before the constructor runs, in order.
    pub fn parameters(&self) -> &[Dependency] {
        &self.parameters
    }

    /// Whether this constructor was marked as the one to use when several
    /// take parameters.
    pub fn is_providing(&self) -> bool {
        self.providing
    }

    pub fn is_parameterless(&self) -> bool {
        self.parameters.is_empty()
    }

    pub(crate) fn invoke(&self, owner: ServiceKey, values: Vec<Instance>) -> Result<Instance> {
        let mut arguments = Arguments {
            owner,
            values: values.into_iter(),
        };
        (self.build)(&mut arguments)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .field("providing", &self.providing)
            .finish()
    }
}

/// Resolved constructor arguments, consumed in parameter order.
pub struct Arguments {
    owner: ServiceKey,
    values: std::vec::IntoIter<Instance>,
}

impl Arguments {
    /// Takes the next argument.
    ///
    /// # Errors
    /// [`SanduqError::ConstructionFailed`] if the constructor reads more
    /// arguments than it declared, or reads them as the wrong type.
    pub fn take<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let value = self.values.next().ok_or_else(|| {
            SanduqError::construction(
                self.owner,
                format!(
                    "Constructor read more arguments than it declared (wanted {})",
                    ServiceKey::of::<T>().short_name()
                ),
            )
        })?;
        downcast::<T>(&value)
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Everything the container knows about a type.
#[derive(Clone)]
pub struct TypeDescriptor {
    key: ServiceKey,
    kind: TypeKind,
    singleton: Option<SingletonPolicy>,
    contracts: Vec<(ServiceKey, Caster)>,
    disposer: Option<Disposer>,
}

impl TypeDescriptor {
    /// Starts describing a concrete type.
    pub fn builder<T: Send + Sync + 'static>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            constructors: Vec::new(),
            singleton: None,
            contracts: Vec::new(),
            disposer: None,
            _marker: PhantomData,
        }
    }

    /// Describes an abstract contract.
    pub fn contract<T: ?Sized + 'static>() -> Self {
        Self::bare(ServiceKey::of::<T>(), TypeKind::Contract)
    }

    /// Describes a concrete type with no constructors.
    ///
    /// Such types resolve only when registered explicitly.
    pub fn opaque<T: ?Sized + 'static>() -> Self {
        Self::bare(ServiceKey::of::<T>(), TypeKind::Concrete(Vec::new()))
    }

    /// Describes an instantiation of a generic request type.
    pub fn generic<T: ?Sized + 'static>(shape: GenericShape) -> Self {
        Self::bare(ServiceKey::of::<T>(), TypeKind::Generic(shape))
    }

    fn bare(key: ServiceKey, kind: TypeKind) -> Self {
        Self {
            key,
            kind,
            singleton: None,
            contracts: Vec::new(),
            disposer: None,
        }
    }

    #[inline]
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The singleton policy declared by the type, if any.
    #[inline]
    pub fn singleton_policy(&self) -> Option<SingletonPolicy> {
        self.singleton
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    pub(crate) fn disposer(&self) -> Option<&Disposer> {
        self.disposer.as_ref()
    }

    /// Constructors of a concrete type. Empty for contracts and generics.
    pub fn constructors(&self) -> &[Constructor] {
        match &self.kind {
            TypeKind::Concrete(constructors) => constructors,
            _ => &[],
        }
    }

    /// Contracts the type declared it implements, not counting itself.
    pub fn contracts(&self) -> impl Iterator<Item = ServiceKey> + '_ {
        self.contracts.iter().map(|(key, _)| *key)
    }

    /// Whether an instance of this type may be bound to `contract`.
    ///
    /// Every type is assignable to itself.
    pub fn is_assignable_to(&self, contract: &ServiceKey) -> bool {
        self.key == *contract || self.contracts.iter().any(|(key, _)| key == contract)
    }

    pub(crate) fn caster_to(&self, contract: &ServiceKey) -> Option<Caster> {
        if self.key == *contract {
            let identity: Caster = Arc::new(|instance: Instance| -> Result<Instance> { Ok(instance) });
            return Some(identity);
        }
        self.contracts
            .iter()
            .find(|(key, _)| key == contract)
            .map(|(_, caster)| caster.clone())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            TypeKind::Concrete(constructors) => format!("Concrete({})", constructors.len()),
            TypeKind::Contract => "Contract".to_string(),
            TypeKind::Generic(shape) => format!("Generic({:?})", shape.template()),
        };
        let contracts: Vec<_> = self.contracts().collect();
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("kind", &kind)
            .field("singleton", &self.singleton)
            .field("contracts", &contracts)
            .field("disposable", &self.is_disposable())
            .finish()
    }
}

/// Builds the descriptor of a concrete type `T`.
///
/// Created by [`TypeDescriptor::builder`].
pub struct DescriptorBuilder<T> {
    constructors: Vec<Constructor>,
    singleton: Option<SingletonPolicy>,
    contracts: Vec<(ServiceKey, Caster)>,
    disposer: Option<Disposer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    /// Adds a constructor taking `parameters`.
    pub fn constructor<F>(self, parameters: Vec<Dependency>, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.push_constructor(parameters, false, build)
    }

    /// Adds a constructor marked as providing.
    ///
    /// When a type has several constructors with parameters, the one marked
    /// providing is used.
    pub fn providing_constructor<F>(self, parameters: Vec<Dependency>, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.push_constructor(parameters, true, build)
    }

    /// Adds a parameterless constructor calling `T::default()`.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(Vec::new(), |_| Ok(T::default()))
    }

    fn push_constructor<F>(mut self, parameters: Vec<Dependency>, providing: bool, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        let build: Build =
            Arc::new(move |arguments: &mut Arguments| build(arguments).map(|value| erase(Arc::new(value))));
        self.constructors.push(Constructor {
            parameters,
            providing,
            build,
        });
        self
    }

    /// Declares `T` a singleton created according to `policy`.
    pub fn singleton(mut self, policy: SingletonPolicy) -> Self {
        self.singleton = Some(policy);
        self
    }

    /// Declares that `T` may be bound to contract `C`.
    ///
    /// `cast` is almost always `|it| it`, letting the compiler perform the
    /// unsizing coercion to `Arc<dyn Trait>`.
    pub fn implements<C: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<C>) -> Self {
        let contract = ServiceKey::of::<C>();
        let caster: Caster = Arc::new(move |instance: Instance| {
            let value = downcast::<T>(&instance)?;
            Ok(erase(cast(value)))
        });
        self.contracts.retain(|(key, _)| *key != contract);
        self.contracts.push((contract, caster));
        self
    }

    /// Registers `T`'s [`Dispose`] impl with containers that own its
    /// instances.
    pub fn disposable(mut self) -> Self
    where
        T: Dispose,
    {
        self.disposer = Some(disposer_for::<T>());
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            key: ServiceKey::of::<T>(),
            kind: TypeKind::Concrete(self.constructors),
            singleton: self.singleton,
            contracts: self.contracts,
            disposer: self.disposer,
        }
    }
}

macro_rules! opaque_injectable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Injectable for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::opaque::<$ty>()
                }
            }
        )*
    };
}

opaque_injectable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    &'static str,
);

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Send + Sync {
        fn corners(&self) -> u32;
    }

    struct Square;
    impl Shape for Square {
        fn corners(&self) -> u32 {
            4
        }
    }

    impl Injectable for Square {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::builder::<Self>()
                .constructor(vec![], |_| Ok(Square))
                .implements::<dyn Shape>(|it| it)
                .build()
        }
    }

    #[test]
    fn concrete_descriptor() {
        let descriptor = Square::descriptor();
        assert_eq!(descriptor.key(), ServiceKey::of::<Square>());
        assert_eq!(descriptor.constructors().len(), 1);
        assert!(descriptor.constructors()[0].is_parameterless());
        assert!(descriptor.singleton_policy().is_none());
        assert!(!descriptor.is_disposable());
    }

    #[test]
    fn assignability() {
        let descriptor = Square::descriptor();
        assert!(descriptor.is_assignable_to(&ServiceKey::of::<Square>()));
        assert!(descriptor.is_assignable_to(&ServiceKey::of::<dyn Shape>()));
        assert!(!descriptor.is_assignable_to(&ServiceKey::of::<String>()));
    }

    #[test]
    fn caster_converts_to_contract() {
        let descriptor = Square::descriptor();
        let cast = descriptor.caster_to(&ServiceKey::of::<dyn Shape>()).unwrap();
        let shape = downcast::<dyn Shape>(&cast(erase(Arc::new(Square))).unwrap()).unwrap();
        assert_eq!(shape.corners(), 4);
        assert!(descriptor.caster_to(&ServiceKey::of::<u8>()).is_none());
    }

    #[test]
    fn constructor_reads_arguments_in_order() {
        let descriptor = TypeDescriptor::builder::<String>()
            .constructor(vec![Dependency::of::<u8>(), Dependency::of::<bool>()], |arguments| {
                let n = arguments.take::<u8>()?;
                let flag = arguments.take::<bool>()?;
                Ok(format!("{n}:{flag}"))
            })
            .build();

        let constructor = &descriptor.constructors()[0];
        let built = constructor
            .invoke(
                descriptor.key(),
                vec![erase(Arc::new(3u8)), erase(Arc::new(true))],
            )
            .unwrap();
        assert_eq!(*downcast::<String>(&built).unwrap(), "3:true");
    }

    #[test]
    fn reading_past_the_end_fails() {
        let descriptor = TypeDescriptor::builder::<String>()
            .constructor(vec![], |arguments| {
                let n = arguments.take::<u8>()?;
                Ok(n.to_string())
            })
            .build();

        let result = descriptor.constructors()[0].invoke(descriptor.key(), Vec::new());
        assert!(matches!(result, Err(SanduqError::ConstructionFailed { .. })));
    }

    #[test]
    fn opaque_and_contract_have_no_constructors() {
        assert!(String::descriptor().constructors().is_empty());
        assert!(matches!(
            TypeDescriptor::contract::<dyn Shape>().kind(),
            TypeKind::Contract
        ));
    }

    #[test]
    fn dependency_describes_lazily() {
        let dependency = Dependency::of::<Square>();
        assert_eq!(dependency.key(), ServiceKey::of::<Square>());
        assert_eq!(dependency.describe().key(), ServiceKey::of::<Square>());
        assert!(format!("{dependency:?}").contains("Square"));
    }
}
