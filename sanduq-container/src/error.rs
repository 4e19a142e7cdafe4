//! Error types for Sanduq container operations.
//!
//! Every failure names the service involved and, where it helps, how to
//! fix it. Errors are never retried or swallowed by the container.

use std::fmt;

use sanduq_support::rendering::render_chain;

use crate::key::ServiceKey;
use crate::settings::Mode;

/// Main error type for all Sanduq operations.
#[derive(Debug, thiserror::Error)]
pub enum SanduqError {
    /// The requested concrete type has no constructor the selector accepts.
    #[error("{}", .0)]
    NoSuitableConstructor(NoSuitableConstructorError),

    /// The requested type is a contract with no bound implementation.
    #[error("{}", .0)]
    NoImplementationGiven(NoImplementationError),

    /// A type reappeared in the chain of types being constructed.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A constructor-built binding collided with an existing binding.
    #[error("{}", .0)]
    DuplicateRegistration(DuplicateRegistrationError),

    /// A single value was requested for a key with several bindings.
    #[error("{}", .0)]
    MultipleTypesRegistered(MultipleTypesRegisteredError),

    /// Registration or implicit construction was refused by the container mode.
    #[error("{}", .0)]
    ContainerLocked(ContainerLockedError),

    /// The mode of a locked container cannot change.
    #[error("Container mode is Locked and cannot be changed to {requested}")]
    InvalidModeTransition { requested: Mode },

    /// The implementation cannot be bound to the contract.
    #[error(
        "{implementation} cannot be bound to {contract}: it does not declare the contract\n  Hint: add .implements::<{contract_short}>(..) to its descriptor",
        contract_short = .contract.short_name()
    )]
    InvalidImplementationBinding {
        contract: ServiceKey,
        implementation: ServiceKey,
    },

    /// A factory or constructor returned an error, or produced the wrong type.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: ServiceKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A deferred factory outlived the container it resolves from.
    #[error("Container backing {key} was dropped before the value was requested")]
    ContainerDropped { key: ServiceKey },
}

impl SanduqError {
    /// Wraps any error raised while building `key`.
    pub fn construction(
        key: ServiceKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SanduqError::ConstructionFailed {
            key,
            source: source.into(),
        }
    }
}

/// No usable constructor was found.
#[derive(Debug)]
pub struct NoSuitableConstructorError {
    /// The type that was being built.
    pub requested: ServiceKey,
    /// How many constructors the descriptor declared.
    pub constructors: usize,
    /// How many of them were marked as providing.
    pub providing: usize,
}

impl fmt::Display for NoSuitableConstructorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No suitable constructor found for {}", self.requested)?;
        match self.constructors {
            0 => write!(
                f,
                "\n  It declares no constructor\n  Hint: register an instance or a factory for {}",
                self.requested.short_name()
            ),
            n => write!(
                f,
                "\n  It declares {n} constructors with parameters and {} marked as providing\n  Hint: mark exactly one constructor as providing",
                self.providing
            ),
        }
    }
}

/// A contract was requested but nothing implements it.
#[derive(Debug)]
pub struct NoImplementationError {
    /// The contract that was requested.
    pub requested: ServiceKey,
    /// The type whose construction needed it, if any.
    pub required_by: Option<ServiceKey>,
    /// Registered services with similar names.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NoImplementationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No implementation given for {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to call .register_implementation::<{}, _>()?",
            self.requested.short_name()
        )
    }
}

/// A type depends on itself, directly or through others.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain that closes the cycle, ending with the repeated type.
    pub chain: Vec<ServiceKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(ServiceKey::short_name).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))?;
        write!(
            f,
            "\n  Hint: Break the cycle with Factory<T> or Lazy<T>, or restructure the dependencies"
        )
    }
}

/// Two bindings collided where only one is allowed.
#[derive(Debug)]
pub struct DuplicateRegistrationError {
    pub key: ServiceKey,
}

impl fmt::Display for DuplicateRegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type already registered: {}", self.key)?;
        write!(
            f,
            "\n  Hint: {} was already built through its constructor in this container",
            self.key.short_name()
        )
    }
}

/// More than one binding exists for a single-value request.
#[derive(Debug)]
pub struct MultipleTypesRegisteredError {
    pub key: ServiceKey,
    /// Number of bindings registered for the key.
    pub count: usize,
}

impl fmt::Display for MultipleTypesRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bindings registered for {}, cannot pick one",
            self.count, self.key
        )?;
        write!(
            f,
            "\n  Hint: request Many<{}> to receive all of them",
            self.key.short_name()
        )
    }
}

/// The container mode refused an operation.
#[derive(Debug)]
pub struct ContainerLockedError {
    /// Mode at the time of the refusal.
    pub mode: Mode,
    /// What was attempted, e.g. `"register_factory"`.
    pub operation: &'static str,
    /// The service involved.
    pub key: ServiceKey,
}

impl fmt::Display for ContainerLockedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Container is {}: {} refused for {}",
            self.mode, self.operation, self.key
        )?;
        if self.mode == Mode::Strict {
            write!(
                f,
                "\n  Hint: Strict containers only resolve explicitly registered types"
            )?;
        }
        Ok(())
    }
}

/// Convenient Result type for Sanduq operations.
pub type Result<T> = std::result::Result<T, SanduqError>;
