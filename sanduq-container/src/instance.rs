//! Type-erased instances and disposal.
//!
//! The container moves values around as [`Instance`]: an `Arc<dyn Any>`
//! whose payload is the `Arc<T>` callers finally receive. Keeping the
//! inner `Arc<T>` (rather than `T`) is what lets `dyn Trait` contracts and
//! shared singletons travel through the same erased channel.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::error::{Result, SanduqError};
use crate::key::ServiceKey;

/// A produced value with its type erased.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Releases resources held by a service when its container is disposed.
///
/// Only instances the container owns are disposed: singletons it realised
/// and instances handed to it through registration.
pub trait Dispose: Send + Sync {
    fn dispose(&self);
}

/// Erased disposal hook, built from a type's descriptor.
///
/// Turns an instance back into the object to dispose, or `None` when the
/// instance is not of the type the hook was built for.
pub type Disposer = Arc<dyn Fn(&Instance) -> Option<Arc<dyn Dispose>> + Send + Sync>;

/// Erases a shared value.
#[inline]
pub fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}

/// Recovers the shared value from an instance produced for `T`.
///
/// # Errors
/// [`SanduqError::ConstructionFailed`] when the payload is not an `Arc<T>`.
pub fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Result<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
        SanduqError::construction(
            ServiceKey::of::<T>(),
            format!("Type mismatch: expected {}", type_name::<Arc<T>>()),
        )
    })
}

/// Builds the disposal hook for `T`.
pub(crate) fn disposer_for<T: Dispose + 'static>() -> Disposer {
    Arc::new(|instance: &Instance| {
        instance
            .downcast_ref::<Arc<T>>()
            .map(|value| value.clone() as Arc<dyn Dispose>)
    })
}

/// Whether two disposables are the same object.
#[inline]
pub(crate) fn same_object(a: &Arc<dyn Dispose>, b: &Arc<dyn Dispose>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct Polite;
    impl Greeter for Polite {
        fn greet(&self) -> &'static str {
            "good day"
        }
    }

    #[test]
    fn erase_and_recover_keeps_identity() {
        let value = Arc::new(7u32);
        let instance = erase(value.clone());
        let back = downcast::<u32>(&instance).unwrap();
        assert!(Arc::ptr_eq(&value, &back));
    }

    #[test]
    fn trait_objects_travel_erased() {
        let greeter: Arc<dyn Greeter> = Arc::new(Polite);
        let instance = erase(greeter);
        let back = downcast::<dyn Greeter>(&instance).unwrap();
        assert_eq!(back.greet(), "good day");
    }

    #[test]
    fn wrong_type_is_construction_failure() {
        let instance = erase(Arc::new(7u32));
        match downcast::<String>(&instance) {
            Err(SanduqError::ConstructionFailed { key, .. }) => {
                assert_eq!(key, ServiceKey::of::<String>());
            }
            other => panic!("Expected ConstructionFailed, got: {other:?}"),
        }
    }

    #[test]
    fn disposer_calls_dispose() {
        struct Counted(AtomicU32);
        impl Dispose for Counted {
            fn dispose(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let value = Arc::new(Counted(AtomicU32::new(0)));
        let disposer = disposer_for::<Counted>();
        let service = disposer(&erase(value.clone())).unwrap();
        service.dispose();
        assert_eq!(value.0.load(Ordering::SeqCst), 1);

        let again = disposer(&erase(value.clone())).unwrap();
        assert!(same_object(&service, &again));
        assert!(disposer(&erase(Arc::new(1u8))).is_none());
    }
}
