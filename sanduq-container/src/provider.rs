//! Provider trait: a module of related registrations.
//!
//! # Examples
//! ```rust
//! use sanduq_container::prelude::*;
//!
//! struct SettingsProvider;
//!
//! impl Provider for SettingsProvider {
//!     fn register(&self, container: &Container) -> Result<()> {
//!         container.register_value(String::from("postgres://localhost"))?;
//!         container.register_value(8080u16)
//!     }
//! }
//!
//! let container = Container::builder()
//!     .provider(SettingsProvider)
//!     .mode(Mode::Locked)
//!     .build()
//!     .unwrap();
//! assert_eq!(*container.resolve::<u16>().unwrap(), 8080);
//! ```

use crate::container::Container;
use crate::error::Result;

/// Registers a group of related services into a container.
///
/// Split registrations by domain instead of keeping one long block:
///
/// ```rust,ignore
/// Container::builder()
///     .provider(DatabaseProvider)
///     .provider(MailProvider)
///     .build()?;
/// ```
pub trait Provider: Send + Sync {
    /// Registers this provider's services.
    ///
    /// Called once, while the container still accepts registrations.
    fn register(&self, container: &Container) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
