//! Instance lifecycles.
//!
//! Two knobs decide how long a produced value lives:
//! - [`Lifecycle`] is chosen by whoever registers a binding.
//! - [`SingletonPolicy`] is declared by the type itself (through its
//!   descriptor) and decides *when* the single instance is created.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sharing mode requested at registration time.
///
/// # Examples
/// ```
/// use sanduq_container::lifecycle::Lifecycle;
///
/// assert!(Lifecycle::Singleton.is_shared());
/// assert!(!Lifecycle::Transient.is_shared());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// The producer runs on every resolution.
    #[default]
    Transient,

    /// The producer runs once; later resolutions get the same instance.
    ///
    /// The instance lives until the owning container is disposed.
    Singleton,
}

impl Lifecycle {
    /// Returns `true` if produced values are cached.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Lifecycle::Singleton)
    }
}

impl From<bool> for Lifecycle {
    fn from(singleton: bool) -> Self {
        if singleton {
            Lifecycle::Singleton
        } else {
            Lifecycle::Transient
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Transient => write!(f, "Transient"),
            Lifecycle::Singleton => write!(f, "Singleton"),
        }
    }
}

/// When a type declared as singleton gets its instance.
///
/// Applied once, when the container first builds a producer for the type
/// through its constructor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingletonPolicy {
    /// Created by the first resolution.
    #[default]
    FirstResolve,

    /// Created while the type is being registered.
    Registration,

    /// Created by [`Container::initialize_services`](crate::container::Container::initialize_services),
    /// or by an earlier resolution, whichever comes first.
    Initialization,
}

impl fmt::Display for SingletonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonPolicy::FirstResolve => write!(f, "created on first resolve"),
            SingletonPolicy::Registration => write!(f, "created on registration"),
            SingletonPolicy::Initialization => write!(f, "created during initialization"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_from_flag() {
        assert_eq!(Lifecycle::from(true), Lifecycle::Singleton);
        assert_eq!(Lifecycle::from(false), Lifecycle::Transient);
    }

    #[test]
    fn lifecycle_default_is_transient() {
        assert_eq!(Lifecycle::default(), Lifecycle::Transient);
    }

    #[test]
    fn lifecycle_display() {
        assert_eq!(Lifecycle::Singleton.to_string(), "Singleton");
        assert_eq!(Lifecycle::Transient.to_string(), "Transient");
    }

    #[test]
    fn policy_serializes_snake_case() {
        let json = serde_json::to_string(&SingletonPolicy::FirstResolve).unwrap();
        assert_eq!(json, "\"first_resolve\"");

        let policy: SingletonPolicy = serde_json::from_str("\"initialization\"").unwrap();
        assert_eq!(policy, SingletonPolicy::Initialization);
    }
}
