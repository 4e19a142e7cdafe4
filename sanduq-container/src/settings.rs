//! Container configuration.
//!
//! [`ContainerSettings`] is plain data so hosts can keep it next to the rest
//! of their configuration and load it with any serde format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating mode of a container.
///
/// Modes only tighten: once [`Mode::Locked`] is set it can never change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Unknown types are built through their constructor and cached.
    #[default]
    Regular,

    /// Unknown types fail to resolve. Explicit registration is still allowed.
    Strict,

    /// Unknown types fail to resolve and nothing can be registered.
    Locked,
}

impl Mode {
    /// Returns `true` if unseen types may be constructed implicitly.
    #[inline]
    pub fn allows_implicit_construction(&self) -> bool {
        matches!(self, Mode::Regular)
    }

    /// Returns `true` if new bindings may be added.
    #[inline]
    pub fn allows_registration(&self) -> bool {
        !matches!(self, Mode::Locked)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Regular => write!(f, "Regular"),
            Mode::Strict => write!(f, "Strict"),
            Mode::Locked => write!(f, "Locked"),
        }
    }
}

/// Settings applied when a container is built.
///
/// ```
/// use sanduq_container::settings::{ContainerSettings, Mode};
///
/// let settings = ContainerSettings::default();
/// assert_eq!(settings.mode, Mode::Regular);
/// assert!(settings.default_resolvers);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Mode the container starts in.
    pub mode: Mode,

    /// Install the built-in generic resolvers (`Factory`, `Many`, `Lazy`).
    pub default_resolvers: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Regular,
            default_resolvers: true,
        }
    }
}
