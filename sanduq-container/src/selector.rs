//! Constructor selection and constructor-backed producers.

use std::sync::Arc;

use tracing::trace;

use crate::context::ResolutionContext;
use crate::descriptor::{Constructor, TypeDescriptor, TypeKind};
use crate::error::{NoImplementationError, NoSuitableConstructorError, Result, SanduqError};
use crate::key::ServiceKey;
use crate::registry::Producer;

/// Picks the constructor used to build `descriptor`'s type.
///
/// In order of preference:
/// 1. the parameterless constructor,
/// 2. the only constructor,
/// 3. the only constructor marked as providing.
///
/// `suggestions` is only called when the type turns out to be a contract.
pub(crate) fn select<'d>(
    descriptor: &'d TypeDescriptor,
    requester: Option<ServiceKey>,
    suggestions: impl FnOnce() -> Vec<String>,
) -> Result<&'d Constructor> {
    let key = descriptor.key();
    let constructors = match descriptor.kind() {
        TypeKind::Contract => {
            return Err(SanduqError::NoImplementationGiven(NoImplementationError {
                requested: key,
                required_by: requester,
                suggestions: suggestions(),
            }));
        }
        TypeKind::Generic(_) => &[][..],
        TypeKind::Concrete(constructors) => constructors.as_slice(),
    };

    if let Some(constructor) = constructors.iter().find(|c| c.is_parameterless()) {
        trace!(key = %key, "Selected parameterless constructor");
        return Ok(constructor);
    }

    if let [only] = constructors {
        trace!(key = %key, parameters = only.parameters().len(), "Selected only constructor");
        return Ok(only);
    }

    let providing: Vec<&Constructor> = constructors.iter().filter(|c| c.is_providing()).collect();
    match providing.as_slice() {
        [chosen] => {
            trace!(key = %key, "Selected providing constructor");
            Ok(*chosen)
        }
        _ => Err(SanduqError::NoSuitableConstructor(NoSuitableConstructorError {
            requested: key,
            constructors: constructors.len(),
            providing: providing.len(),
        })),
    }
}

/// Wraps `constructor` into a producer.
///
/// The producer puts `key` on the resolution chain, resolves every
/// parameter in order and then runs the constructor.
pub(crate) fn constructor_producer(key: ServiceKey, constructor: Constructor) -> Producer {
    Arc::new(move |ctx: &mut ResolutionContext| {
        ctx.within(key, |ctx| {
            let mut values = Vec::with_capacity(constructor.parameters().len());
            for parameter in constructor.parameters() {
                values.push(ctx.resolve_dependency(parameter)?);
            }
            constructor.invoke(key, values)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Dependency;

    trait Mailer: Send + Sync {}

    fn ptr(constructor: &Constructor) -> *const Constructor {
        constructor as *const Constructor
    }

    #[test]
    fn parameterless_wins() {
        let descriptor = TypeDescriptor::builder::<String>()
            .providing_constructor(vec![Dependency::of::<u8>()], |_| Ok(String::new()))
            .constructor(vec![], |_| Ok(String::new()))
            .build();

        let chosen = select(&descriptor, None, Vec::new).unwrap();
        assert!(chosen.is_parameterless());
    }

    #[test]
    fn single_constructor_is_used() {
        let descriptor = TypeDescriptor::builder::<String>()
            .constructor(vec![Dependency::of::<u8>()], |_| Ok(String::new()))
            .build();

        let chosen = select(&descriptor, None, Vec::new).unwrap();
        assert_eq!(ptr(chosen), ptr(&descriptor.constructors()[0]));
    }

    #[test]
    fn providing_breaks_ties() {
        let descriptor = TypeDescriptor::builder::<String>()
            .constructor(vec![Dependency::of::<u8>()], |_| Ok(String::new()))
            .providing_constructor(vec![Dependency::of::<u16>()], |_| Ok(String::new()))
            .build();

        let chosen = select(&descriptor, None, Vec::new).unwrap();
        assert!(chosen.is_providing());
    }

    #[test]
    fn ambiguous_constructors_fail() {
        let descriptor = TypeDescriptor::builder::<String>()
            .constructor(vec![Dependency::of::<u8>()], |_| Ok(String::new()))
            .constructor(vec![Dependency::of::<u16>()], |_| Ok(String::new()))
            .build();

        match select(&descriptor, None, Vec::new) {
            Err(SanduqError::NoSuitableConstructor(e)) => {
                assert_eq!(e.constructors, 2);
                assert_eq!(e.providing, 0);
            }
            other => panic!("Expected NoSuitableConstructor, got: {other:?}"),
        }
    }

    #[test]
    fn opaque_types_fail() {
        let descriptor = TypeDescriptor::opaque::<String>();
        assert!(matches!(
            select(&descriptor, None, Vec::new),
            Err(SanduqError::NoSuitableConstructor(_))
        ));
    }

    #[test]
    fn contracts_report_requester_and_suggestions() {
        let descriptor = TypeDescriptor::contract::<dyn Mailer>();
        let requester = ServiceKey::of::<String>();

        match select(&descriptor, Some(requester), || vec!["SmtpMailer".into()]) {
            Err(SanduqError::NoImplementationGiven(e)) => {
                assert_eq!(e.required_by, Some(requester));
                assert_eq!(e.suggestions, vec!["SmtpMailer".to_string()]);
            }
            other => panic!("Expected NoImplementationGiven, got: {other:?}"),
        }
    }
}
