//! # Sanduq — descriptor-driven dependency injection for Rust
//!
//! Types describe their constructors through [`Injectable`], usually with
//! `#[derive(Injectable)]`, and a [`Container`] wires them together:
//! unregistered concrete types are built on demand, contracts (`dyn Trait`)
//! are bound to implementations, and `Factory<T>`, `Lazy<T>` and `Many<T>`
//! requests are served by generic resolvers.
//!
//! ```rust
//! use sanduq::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! #[injectable(singleton)]
//! struct Clock;
//!
//! #[derive(Injectable)]
//! struct Greeter {
//!     clock: Arc<Clock>,
//! }
//!
//! let container = Container::new();
//! let a = container.resolve::<Greeter>().unwrap();
//! let b = container.resolve::<Greeter>().unwrap();
//! assert!(Arc::ptr_eq(&a.clock, &b.clock));
//! ```

pub use sanduq_container::*;
pub use sanduq_derive::*;
pub use sanduq_support::*;

pub mod prelude {
    pub use sanduq_container::prelude::*;
    pub use sanduq_derive::Injectable;
}
