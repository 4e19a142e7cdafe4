//! # The Container — heart of Sanduq
//!
//! A container owns a registry of producers, a list of other containers it
//! may read bindings from, the disposables it is responsible for, and a
//! [`Mode`]. Unknown concrete types are built through their descriptor's
//! constructor and cached, so most services need no registration at all.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──create_child()──> Container
//!                                   │                             │
//!                               Registry                  reads parent bindings
//!                      (explicit, constructed, many)
//! ```
//!
//! # Examples
//! ```rust
//! use sanduq_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! impl Injectable for dyn Logger {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::contract::<dyn Logger>()
//!     }
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String { format!("[console] {msg}") }
//! }
//!
//! impl Injectable for ConsoleLogger {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .constructor(vec![], |_| Ok(ConsoleLogger))
//!             .implements::<dyn Logger>(|it| it)
//!             .build()
//!     }
//! }
//!
//! let container = Container::builder().build().expect("Failed to build container");
//! container
//!     .register_implementation::<dyn Logger, ConsoleLogger>(Lifecycle::Singleton)
//!     .expect("Failed to register");
//!
//! let logger = container.resolve::<dyn Logger>().expect("Failed to resolve");
//! assert_eq!(logger.log("hi"), "[console] hi");
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use sanduq_support::rendering::suggest_similar;
use tracing::{debug, info, instrument, trace};

use crate::context::ResolutionContext;
use crate::descriptor::{Dependency, Injectable, TypeDescriptor, TypeKind};
use crate::error::{
    CircularDependencyError, ContainerLockedError, DuplicateRegistrationError, Result, SanduqError,
};
use crate::generic::{GenericResolver, default_resolvers};
use crate::instance::{Dispose, Instance, downcast, erase, same_object};
use crate::key::ServiceKey;
use crate::lifecycle::{Lifecycle, SingletonPolicy};
use crate::provider::Provider;
use crate::registry::{Producer, Registry};
use crate::selector;
use crate::settings::{ContainerSettings, Mode};
use crate::singleton;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`].
///
/// # Examples
/// ```rust
/// use sanduq_container::prelude::*;
///
/// let container = Container::builder()
///     .mode(Mode::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(container.mode(), Mode::Strict);
/// ```
pub struct ContainerBuilder {
    settings: ContainerSettings,
    resolvers: Vec<Arc<dyn GenericResolver>>,
    providers: Vec<Box<dyn Provider>>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            resolvers: Vec::new(),
            providers: Vec::new(),
        }
    }

    /// Mode the container is left in once built.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.settings.mode = mode;
        self
    }

    /// Replaces all settings at once.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Leaves out the built-in `Factory`, `Many` and `Lazy` resolvers.
    pub fn without_default_resolvers(mut self) -> Self {
        self.settings.default_resolvers = false;
        self
    }

    /// Appends a generic resolver, consulted after the built-in ones.
    pub fn generic_resolver(mut self, resolver: impl GenericResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Adds a [`Provider`] run during [`build`](ContainerBuilder::build).
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Builds the container.
    ///
    /// Providers run while the container is still [`Mode::Regular`]; the
    /// configured mode is applied afterwards, so a locked container can
    /// still be populated by its providers.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        let mut resolvers = if self.settings.default_resolvers {
            default_resolvers()
        } else {
            Vec::new()
        };
        resolvers.extend(self.resolvers);

        let container = Container::assemble(resolvers.into());
        for provider in &self.providers {
            container.add_provider(provider.as_ref())?;
        }
        container.set_mode(self.settings.mode)?;

        info!(
            registered = container.inner.registry.len(),
            mode = %self.settings.mode,
            resolvers = container.inner.resolvers.len(),
            "Container built"
        );
        Ok(container)
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("settings", &self.settings)
            .field("resolvers", &self.resolvers.len())
            .field("providers", &self.providers.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Something the container disposes of when it is disposed.
enum Tracked {
    Service(Arc<dyn Dispose>),
    Child(WeakContainer),
}

struct ContainerInner {
    registry: Registry,
    containers: RwLock<Vec<Container>>,
    disposables: Mutex<Vec<Tracked>>,
    pending_initialization: Mutex<Vec<ServiceKey>>,
    realizing: Mutex<Vec<ServiceKey>>,
    mode: RwLock<Mode>,
    resolvers: Arc<[Arc<dyn GenericResolver>]>,
}

impl Drop for ContainerInner {
    // A child dropped before its parent is disposed still disposes what it owns.
    fn drop(&mut self) {
        let tracked = std::mem::take(self.disposables.get_mut());
        if !tracked.is_empty() {
            debug!(count = tracked.len(), "Disposing dropped container");
            dispose_all(tracked);
        }
    }
}

fn dispose_all(tracked: Vec<Tracked>) {
    for entry in tracked {
        match entry {
            Tracked::Service(service) => service.dispose(),
            Tracked::Child(child) => {
                if let Some(child) = child.upgrade() {
                    child.dispose();
                }
            }
        }
    }
}

/// Thread-safe dependency injection container.
///
/// Cloning is cheap and yields a handle to the same container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle to a container, held by producers.
#[derive(Clone)]
pub(crate) struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
    pub(crate) fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(|inner| Container { inner })
    }

    fn is_dropped(&self) -> bool {
        self.0.strong_count() == 0
    }
}

/// How a constructor-built producer came to be.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// `register_type`, directly or through an implementation binding.
    Registered,
    /// Built on demand during resolution.
    Implicit,
}

impl Container {
    /// Creates a container with default settings.
    pub fn new() -> Self {
        Self::assemble(default_resolvers().into())
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn assemble(resolvers: Arc<[Arc<dyn GenericResolver>]>) -> Self {
        let container = Container {
            inner: Arc::new(ContainerInner {
                registry: Registry::new(),
                containers: RwLock::new(Vec::new()),
                disposables: Mutex::new(Vec::new()),
                pending_initialization: Mutex::new(Vec::new()),
                realizing: Mutex::new(Vec::new()),
                mode: RwLock::new(Mode::Regular),
                resolvers,
            }),
        };
        container.register_self();
        container
    }

    /// Requests for `Container` (or `dyn Resolver`) receive a fresh child of
    /// the container serving them.
    fn register_self(&self) {
        let weak = self.downgrade();
        let child: Producer = Arc::new(move |_: &mut ResolutionContext| {
            let parent = weak.upgrade().ok_or(SanduqError::ContainerDropped {
                key: ServiceKey::of::<Container>(),
            })?;
            Ok(erase(Arc::new(parent.create_child())))
        });
        let as_resolver: Producer = {
            let child = child.clone();
            Arc::new(move |ctx: &mut ResolutionContext| {
                let container = downcast::<Container>(&child(ctx)?)?;
                Ok(erase(container as Arc<dyn Resolver>))
            })
        };

        self.inner.registry.seed(ServiceKey::of::<Container>(), child);
        self.inner.registry.seed(ServiceKey::of::<dyn Resolver>(), as_resolver);
    }

    pub(crate) fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.inner))
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    // ── Mode ──

    /// Returns the current mode.
    pub fn mode(&self) -> Mode {
        *self.inner.mode.read()
    }

    /// Changes the mode.
    ///
    /// # Errors
    /// [`SanduqError::InvalidModeTransition`] once the container is
    /// [`Mode::Locked`], whatever the requested mode.
    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        let mut current = self.inner.mode.write();
        if *current == Mode::Locked {
            return Err(SanduqError::InvalidModeTransition { requested: mode });
        }
        let previous = *current;
        *current = mode;
        debug!(from = %previous, to = %mode, "Mode changed");
        Ok(())
    }

    fn ensure_registration_allowed(&self, operation: &'static str, key: ServiceKey) -> Result<()> {
        let mode = self.mode();
        if mode.allows_registration() {
            Ok(())
        } else {
            Err(SanduqError::ContainerLocked(ContainerLockedError {
                mode,
                operation,
                key,
            }))
        }
    }

    // ── Registration ──

    /// Binds `T` to a factory.
    ///
    /// The factory receives the running [`ResolutionContext`] and resolves
    /// whatever it needs through it. With [`Lifecycle::Singleton`] it runs
    /// at most once successfully, and the value is disposed with the
    /// container if `T`'s descriptor is disposable. For a contract `T` that
    /// never holds; bind disposable implementations with
    /// [`register_implementation`](Container::register_implementation).
    ///
    /// # Errors
    /// [`SanduqError::ContainerLocked`] in a locked container,
    /// [`SanduqError::DuplicateRegistration`] if `T` was already built
    /// through its constructor here.
    ///
    /// ```rust
    /// use sanduq_container::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let container = Container::new();
    /// container
    ///     .register_factory::<String, _>(|_| Ok(Arc::new("hello".to_string())), Lifecycle::Transient)
    ///     .unwrap();
    /// assert_eq!(*container.resolve::<String>().unwrap(), "hello");
    /// ```
    pub fn register_factory<T, F>(&self, factory: F, lifecycle: impl Into<Lifecycle>) -> Result<()>
    where
        T: ?Sized + Injectable,
        F: Fn(&mut ResolutionContext) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        let lifecycle = lifecycle.into();
        self.ensure_registration_allowed("register_factory", key)?;

        let raw: Producer = Arc::new(move |ctx: &mut ResolutionContext| {
            ctx.within(key, |ctx| factory(ctx).map(erase))
        });
        let producer = if lifecycle.is_shared() {
            singleton::share(key, raw, T::descriptor().disposer().cloned(), self.downgrade())
        } else {
            raw
        };

        let bindings = self.inner.registry.register_explicit(key, producer)?;
        debug!(key = %key, lifecycle = %lifecycle, bindings, "Registered factory");
        Ok(())
    }

    /// Binds `T` to an existing instance.
    ///
    /// The container takes ownership of its disposal right away when `T`'s
    /// own descriptor is disposable. Contracts (`dyn Trait`) carry no
    /// disposer, so a disposable value bound straight under a contract is
    /// never disposed; use [`register_instance_as`](Container::register_instance_as)
    /// for those.
    pub fn register_instance<T: ?Sized + Injectable>(&self, value: Arc<T>) -> Result<()> {
        let key = ServiceKey::of::<T>();
        self.ensure_registration_allowed("register_instance", key)?;

        let instance = erase(value);
        let bindings = self
            .inner
            .registry
            .register_explicit(key, singleton::constant(instance.clone()))?;
        if let Some(disposer) = T::descriptor().disposer() {
            if let Some(service) = disposer(&instance) {
                self.track(service);
            }
        }

        debug!(key = %key, bindings, "Registered instance");
        Ok(())
    }

    /// Binds `T` to `value`.
    pub fn register_value<T: Injectable>(&self, value: T) -> Result<()> {
        self.register_instance(Arc::new(value))
    }

    /// Binds contract `C` to an existing instance of `I`.
    ///
    /// # Errors
    /// [`SanduqError::InvalidImplementationBinding`] if `I` does not declare
    /// `C`.
    pub fn register_instance_as<C, I>(&self, value: Arc<I>) -> Result<()>
    where
        C: ?Sized + Injectable,
        I: Injectable,
    {
        let contract = ServiceKey::of::<C>();
        let descriptor = I::descriptor();
        let cast = descriptor.caster_to(&contract).ok_or(
            SanduqError::InvalidImplementationBinding {
                contract,
                implementation: descriptor.key(),
            },
        )?;
        self.ensure_registration_allowed("register_instance", contract)?;

        let implementation = erase(value);
        let instance = cast(implementation.clone())?;
        let bindings = self
            .inner
            .registry
            .register_explicit(contract, singleton::constant(instance))?;
        if let Some(disposer) = descriptor.disposer() {
            if let Some(service) = disposer(&implementation) {
                self.track(service);
            }
        }

        debug!(contract = %contract, implementation = %descriptor.key(), bindings, "Registered instance");
        Ok(())
    }

    /// Binds contract `C` to implementation `I`.
    ///
    /// `I` gets a producer of its own first (through its constructor, with
    /// its declared singleton policy) unless it already has one here. With
    /// [`Lifecycle::Singleton`] the contract binding caches its instance.
    ///
    /// # Errors
    /// [`SanduqError::InvalidImplementationBinding`] if `I` does not declare
    /// `C`, [`SanduqError::ContainerLocked`] in a locked container, and any
    /// error from building `I`'s producer.
    pub fn register_implementation<C, I>(&self, lifecycle: impl Into<Lifecycle>) -> Result<()>
    where
        C: ?Sized + Injectable,
        I: ?Sized + Injectable,
    {
        self.register_implementation_of(ServiceKey::of::<C>(), &Dependency::of::<I>(), lifecycle)
    }

    /// Erased form of [`register_implementation`](Container::register_implementation).
    pub fn register_implementation_of(
        &self,
        contract: ServiceKey,
        implementation: &Dependency,
        lifecycle: impl Into<Lifecycle>,
    ) -> Result<()> {
        let lifecycle = lifecycle.into();
        let descriptor = implementation.describe();
        let implementation_key = descriptor.key();
        let cast = descriptor.caster_to(&contract).ok_or(
            SanduqError::InvalidImplementationBinding {
                contract,
                implementation: implementation_key,
            },
        )?;
        self.ensure_registration_allowed("register_implementation", contract)?;

        let target = match self.inner.registry.lookup(&implementation_key)? {
            Some(producer) => producer,
            None => self.create_factory(&descriptor, None, Origin::Registered)?,
        };
        let target = if lifecycle.is_shared() {
            singleton::share(
                implementation_key,
                target,
                descriptor.disposer().cloned(),
                self.downgrade(),
            )
        } else {
            target
        };

        let producer: Producer =
            Arc::new(move |ctx: &mut ResolutionContext| cast(target(ctx)?));
        let bindings = self.inner.registry.register_explicit(contract, producer)?;
        debug!(
            contract = %contract,
            implementation = %implementation_key,
            lifecycle = %lifecycle,
            bindings,
            "Registered implementation"
        );
        Ok(())
    }

    /// Builds `T`'s producer now, through its constructor and declared
    /// singleton policy.
    ///
    /// # Errors
    /// [`SanduqError::DuplicateRegistration`] if `T` already has a binding
    /// here, plus anything constructor selection or eager realisation
    /// fails with.
    pub fn register_type<T: ?Sized + Injectable>(&self) -> Result<()> {
        self.register_type_of(&Dependency::of::<T>())
    }

    /// Erased form of [`register_type`](Container::register_type).
    pub fn register_type_of(&self, dependency: &Dependency) -> Result<()> {
        let key = dependency.key();
        self.ensure_registration_allowed("register_type", key)?;
        if self.inner.registry.contains(&key) {
            return Err(SanduqError::DuplicateRegistration(
                DuplicateRegistrationError { key },
            ));
        }
        self.create_factory(&dependency.describe(), None, Origin::Registered)?;
        Ok(())
    }

    /// Runs a [`Provider`] against this container.
    pub fn add_provider(&self, provider: &dyn Provider) -> Result<()> {
        debug!(provider = provider.name(), "Applying provider");
        provider.register(self)
    }

    /// Builds a constructor-backed producer for `descriptor`, applies its
    /// singleton policy and stores it.
    fn create_factory(
        &self,
        descriptor: &TypeDescriptor,
        requester: Option<ServiceKey>,
        origin: Origin,
    ) -> Result<Producer> {
        let key = descriptor.key();
        let constructor = selector::select(descriptor, requester, || self.suggestions_for(&key))?;
        let raw = selector::constructor_producer(key, constructor.clone());

        let policy = descriptor.singleton_policy();
        let disposer = descriptor.disposer().cloned();
        let producer = match policy {
            None => raw,
            Some(SingletonPolicy::FirstResolve) | Some(SingletonPolicy::Initialization) => {
                singleton::share(key, raw, disposer, self.downgrade())
            }
            Some(SingletonPolicy::Registration) => {
                let shared = singleton::share(key, raw, disposer, self.downgrade());
                singleton::constant(self.realize_now(key, &shared)?)
            }
        };

        let stored = match origin {
            Origin::Registered => {
                self.inner.registry.register_constructed(key, producer.clone())?;
                producer.clone()
            }
            Origin::Implicit => self
                .inner
                .registry
                .constructed_or_existing(key, producer.clone())?,
        };

        if policy == Some(SingletonPolicy::Initialization) && Arc::ptr_eq(&stored, &producer) {
            self.inner.pending_initialization.lock().push(key);
        }
        match policy {
            Some(policy) => debug!(key = %key, policy = %policy, "Built singleton producer"),
            None => debug!(key = %key, "Built producer"),
        }
        Ok(stored)
    }

    /// Realises a singleton during registration, in a context of its own.
    fn realize_now(&self, key: ServiceKey, producer: &Producer) -> Result<Instance> {
        {
            let mut realizing = self.inner.realizing.lock();
            if realizing.contains(&key) {
                let mut chain = realizing.clone();
                chain.push(key);
                return Err(SanduqError::CircularDependency(CircularDependencyError {
                    chain,
                }));
            }
            realizing.push(key);
        }

        let mut ctx = ResolutionContext::new(self);
        let realized = producer(&mut ctx);
        self.inner.realizing.lock().retain(|k| *k != key);
        realized
    }

    // ── Composition ──

    /// Lets this container read `other`'s bindings.
    ///
    /// One-directional: `other` does not see this container.
    pub fn add_container(&self, other: &Container) {
        self.inner.containers.write().push(other.clone());
        debug!(added = self.inner.containers.read().len(), "Added container");
    }

    /// Creates a child that reads this container's bindings.
    ///
    /// The child starts in [`Mode::Regular`], shares this container's
    /// generic resolvers and is disposed together with it.
    pub fn create_child(&self) -> Container {
        let child = Container::assemble(self.inner.resolvers.clone());
        child.add_container(self);
        {
            let mut disposables = self.inner.disposables.lock();
            disposables.retain(|tracked| !matches!(tracked, Tracked::Child(c) if c.is_dropped()));
            disposables.push(Tracked::Child(child.downgrade()));
        }
        debug!("Created child container");
        child
    }

    /// This container followed by every container reachable through added
    /// containers, depth-first in the order they were added, each once.
    fn closure(&self) -> Vec<Container> {
        let mut visited = vec![self.clone()];
        let mut index = 0;
        while index < visited.len() {
            let added = visited[index].inner.containers.read().clone();
            let mut insert_at = index + 1;
            for container in added {
                if visited.iter().all(|seen| seen.id() != container.id()) {
                    visited.insert(insert_at, container);
                    insert_at += 1;
                }
            }
            index += 1;
        }
        visited
    }

    // ── Resolution ──

    /// Resolve a service by type.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.resolve()?;
    /// ```
    pub fn resolve<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        let instance = self.resolve_dependency(&Dependency::of::<T>())?;
        downcast::<T>(&instance)
    }

    /// Resolves a dependency with its type erased.
    pub fn resolve_dependency(&self, dependency: &Dependency) -> Result<Instance> {
        trace!(key = %dependency.key(), "Resolving");
        let mut ctx = ResolutionContext::new(self);
        let producer = self.producer_for(dependency, None)?;
        producer(&mut ctx)
    }

    /// Finds or builds the producer for `dependency`.
    ///
    /// Looks in this container, then in added containers, then asks the
    /// generic resolvers, and finally builds the type through its
    /// constructor when the mode allows it.
    pub(crate) fn producer_for(
        &self,
        dependency: &Dependency,
        requester: Option<ServiceKey>,
    ) -> Result<Producer> {
        let key = dependency.key();
        if let Some(producer) = self.find_existing(&key)? {
            return Ok(producer);
        }

        let descriptor = dependency.describe();
        if let TypeKind::Generic(shape) = descriptor.kind() {
            if let Some(resolver) = self.inner.resolvers.iter().find(|r| r.matches(shape)) {
                trace!(key = %key, resolver = resolver.name(), "Synthesizing generic producer");
                return resolver.resolve(shape, self);
            }
        }

        let mode = self.mode();
        if !mode.allows_implicit_construction() {
            return Err(SanduqError::ContainerLocked(ContainerLockedError {
                mode,
                operation: "implicit construction",
                key,
            }));
        }

        self.create_factory(&descriptor, requester, Origin::Implicit)
    }

    fn find_existing(&self, key: &ServiceKey) -> Result<Option<Producer>> {
        if let Some(producer) = self.inner.registry.lookup(key)? {
            return Ok(Some(producer));
        }
        if self.inner.containers.read().is_empty() {
            return Ok(None);
        }

        for container in self.closure().iter().skip(1) {
            if let Some(producer) = container.inner.registry.lookup(key)? {
                trace!(key = %key, "Found binding in added container");
                return Ok(Some(producer));
            }
        }
        Ok(None)
    }

    /// Every multi-bound producer of `key` across the container closure.
    pub(crate) fn collect_bindings(&self, key: &ServiceKey) -> Vec<Producer> {
        self.closure()
            .iter()
            .flat_map(|container| container.inner.registry.multi_bindings(key))
            .collect()
    }

    fn suggestions_for(&self, key: &ServiceKey) -> Vec<String> {
        let keys: Vec<ServiceKey> = self
            .closure()
            .iter()
            .flat_map(|container| container.inner.registry.registered_keys())
            .collect();
        let names: Vec<&str> = keys.iter().map(ServiceKey::type_name).collect();
        suggest_similar(key.type_name(), &names, 3)
    }

    // ── Lifetime ──

    /// Realises every singleton declared with
    /// [`SingletonPolicy::Initialization`] that is not realised yet.
    #[instrument(skip(self), name = "initialize_services")]
    pub fn initialize_services(&self) -> Result<()> {
        let pending = self.inner.pending_initialization.lock().clone();
        info!(count = pending.len(), "Initializing services");

        let mut ctx = ResolutionContext::new(self);
        for key in pending {
            if let Some(producer) = self.inner.registry.lookup(&key)? {
                producer(&mut ctx)?;
            }
        }
        Ok(())
    }

    /// Hands `service` to this container for disposal. Already tracked
    /// objects are ignored.
    pub(crate) fn track(&self, service: Arc<dyn Dispose>) {
        let mut disposables = self.inner.disposables.lock();
        let known = disposables
            .iter()
            .any(|tracked| matches!(tracked, Tracked::Service(s) if same_object(s, &service)));
        if !known {
            disposables.push(Tracked::Service(service));
        }
    }

    /// Disposes every tracked instance and child container, in the order
    /// they were tracked.
    ///
    /// The tracked list is emptied, so a second call disposes nothing. A
    /// container dropped without being disposed disposes its list on drop.
    pub fn dispose(&self) {
        let tracked = std::mem::take(&mut *self.inner.disposables.lock());
        debug!(count = tracked.len(), "Disposing container");
        dispose_all(tracked);
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispose for Container {
    fn dispose(&self) {
        Container::dispose(self);
    }
}

impl Injectable for Container {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .implements::<dyn Resolver>(|it| it)
            .build()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.inner.registry.len())
            .field("containers", &self.inner.containers.read().len())
            .field("mode", &self.mode())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Resolver
// ═══════════════════════════════════════════

/// Object-safe view of a container, for code that only resolves.
pub trait Resolver: Send + Sync {
    fn resolve_dependency(&self, dependency: &Dependency) -> Result<Instance>;
}

impl Resolver for Container {
    fn resolve_dependency(&self, dependency: &Dependency) -> Result<Instance> {
        Container::resolve_dependency(self, dependency)
    }
}

impl Injectable for dyn Resolver {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::contract::<dyn Resolver>()
    }
}

/// Resolve a typed service from a [`Resolver`].
///
/// ```rust,ignore
/// fn build_report(resolver: &dyn Resolver) -> Result<Report> {
///     let db: Arc<Database> = sanduq_container::container::resolve(resolver)?;
///     Ok(Report::new(db))
/// }
/// ```
pub fn resolve<T: ?Sized + Injectable>(resolver: &dyn Resolver) -> Result<Arc<T>> {
    let instance = resolver.resolve_dependency(&Dependency::of::<T>())?;
    downcast::<T>(&instance)
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, Resolver, resolve};
    pub use crate::context::ResolutionContext;
    pub use crate::descriptor::{Arguments, Dependency, Injectable, TypeDescriptor};
    pub use crate::error::{Result, SanduqError};
    pub use crate::generic::{Factory, FactoryWith, Lazy, Many};
    pub use crate::instance::Dispose;
    pub use crate::key::ServiceKey;
    pub use crate::lifecycle::{Lifecycle, SingletonPolicy};
    pub use crate::provider::Provider;
    pub use crate::settings::{ContainerSettings, Mode};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
