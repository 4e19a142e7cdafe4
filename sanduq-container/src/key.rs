//! Service identification keys.
//!
//! [`ServiceKey`] identifies a requested service inside a container.
//! Equality is type identity: every generic instantiation is its own key.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use sanduq_support::rendering::shorten_type_name;

/// Identifies a service in the container.
///
/// # Examples
/// ```
/// use sanduq_container::key::ServiceKey;
///
/// let key = ServiceKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.short_name(), "String");
/// assert_ne!(ServiceKey::of::<Vec<u8>>(), ServiceKey::of::<Vec<u16>>());
/// ```
#[derive(Clone, Copy)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceKey {
    /// Creates a key for type `T`.
    ///
    /// Unsized types are fine, `dyn Trait` contracts are keyed this way.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] behind this key.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceKey {}

// type_name is not guaranteed unique, only TypeId takes part
impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.type_name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Invoice;

    #[test]
    fn key_names_type() {
        let key = ServiceKey::of::<Invoice>();
        assert!(key.type_name().ends_with("Invoice"));
        assert_eq!(key.short_name(), "Invoice");
    }

    #[test]
    fn same_type_same_key() {
        assert_eq!(ServiceKey::of::<Invoice>(), ServiceKey::of::<Invoice>());
    }

    #[test]
    fn generic_instantiations_differ() {
        assert_ne!(ServiceKey::of::<Option<u8>>(), ServiceKey::of::<Option<i8>>());
    }

    #[test]
    fn contract_keys() {
        trait Mailer {}
        assert_ne!(ServiceKey::of::<dyn Mailer>(), ServiceKey::of::<Invoice>());
    }

    #[test]
    fn key_in_hashmap() {
        let mut map = HashMap::new();
        map.insert(ServiceKey::of::<String>(), "string");
        map.insert(ServiceKey::of::<i32>(), "i32");
        assert_eq!(map.get(&ServiceKey::of::<String>()), Some(&"string"));
        assert_eq!(map.get(&ServiceKey::of::<bool>()), None);
    }
}
