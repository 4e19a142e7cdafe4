//! Core container implementation for Sanduq DI.
//!
//! Types describe how they are built through [`Injectable`]; the
//! [`Container`] reads those descriptors to wire object graphs, applying
//! singleton policies, container modes and generic requests such as
//! [`Factory`], [`Lazy`] and [`Many`].

pub mod container;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod generic;
pub mod instance;
pub mod key;
pub mod lifecycle;
pub mod provider;
pub mod registry;
mod selector;
pub mod settings;
mod singleton;

pub use container::{Container, ContainerBuilder, Resolver, prelude, resolve};
pub use context::ResolutionContext;
pub use descriptor::{Arguments, Dependency, DescriptorBuilder, Injectable, TypeDescriptor};
pub use error::{Result, SanduqError};
pub use generic::{Factory, FactoryWith, Lazy, Many};
pub use instance::{Dispose, Instance};
pub use key::ServiceKey;
pub use lifecycle::{Lifecycle, SingletonPolicy};
pub use provider::Provider;
pub use registry::Producer;
pub use settings::{ContainerSettings, Mode};
