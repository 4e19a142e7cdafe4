use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use sanduq::prelude::*;

trait Repository: Send + Sync {
    fn table(&self) -> &'static str;
}

impl Injectable for dyn Repository {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::contract::<dyn Repository>()
    }
}

trait Auditable: Send + Sync {}

impl Injectable for dyn Auditable {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::contract::<dyn Auditable>()
    }
}

#[derive(Injectable)]
#[injectable(singleton)]
struct Pool;

#[derive(Injectable)]
#[injectable(implements = "dyn Repository", implements = "dyn Auditable")]
struct UserRepository {
    pool: Arc<Pool>,
    #[inject(default)]
    queries: AtomicU32,
}

impl Repository for UserRepository {
    fn table(&self) -> &'static str {
        self.queries.fetch_add(1, Ordering::SeqCst);
        "users"
    }
}

impl Auditable for UserRepository {}

#[derive(Injectable)]
struct UserService {
    repository: Arc<dyn Repository>,
    pool: Arc<Pool>,
}

#[derive(Default)]
struct Connections {
    closed: AtomicU32,
}

impl Dispose for Connections {
    fn dispose(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Injectable)]
#[injectable(singleton = "registration", disposable)]
struct Broker {
    #[inject(default)]
    connections: Connections,
}

impl Dispose for Broker {
    fn dispose(&self) {
        self.connections.dispose();
    }
}

#[derive(Injectable)]
#[injectable(singleton = "initialization")]
struct Warmup {
    _pool: Arc<Pool>,
}

#[derive(Injectable)]
#[injectable(crate = "::sanduq")]
struct Renamed;

#[test]
fn unit_struct_resolves() {
    let container = Container::new();
    assert!(container.resolve::<Renamed>().is_ok());
}

#[test]
fn singleton_word_shares_instances() {
    let container = Container::new();
    let a = container.resolve::<Pool>().unwrap();
    let b = container.resolve::<Pool>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn fields_are_wired_and_defaults_filled() {
    let container = Container::new();
    let repository = container.resolve::<UserRepository>().unwrap();
    let pool = container.resolve::<Pool>().unwrap();

    assert!(Arc::ptr_eq(&repository.pool, &pool));
    assert_eq!(repository.queries.load(Ordering::SeqCst), 0);
}

#[test]
fn implements_binds_contracts() {
    let container = Container::new();
    container
        .register_implementation::<dyn Repository, UserRepository>(Lifecycle::Singleton)
        .unwrap();
    container
        .register_implementation::<dyn Auditable, UserRepository>(Lifecycle::Transient)
        .unwrap();

    let service = container.resolve::<UserService>().unwrap();
    assert_eq!(service.repository.table(), "users");
    assert!(Arc::ptr_eq(&service.pool, &container.resolve::<Pool>().unwrap()));
    assert!(container.resolve::<dyn Auditable>().is_ok());
}

#[test]
fn descriptor_reflects_attributes() {
    let descriptor = UserRepository::descriptor();
    assert!(descriptor.is_assignable_to(&ServiceKey::of::<dyn Repository>()));
    assert!(descriptor.is_assignable_to(&ServiceKey::of::<dyn Auditable>()));
    assert_eq!(descriptor.constructors().len(), 1);
    assert_eq!(descriptor.constructors()[0].parameters().len(), 1);
    assert!(descriptor.singleton_policy().is_none());

    let broker = Broker::descriptor();
    assert_eq!(broker.singleton_policy(), Some(SingletonPolicy::Registration));
    assert!(broker.is_disposable());
}

#[test]
fn registration_singleton_is_disposed_with_container() {
    let container = Container::new();
    container.register_type::<Broker>().unwrap();
    let broker = container.resolve::<Broker>().unwrap();

    container.dispose();
    assert_eq!(broker.connections.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn initialization_singleton_waits_for_initialize() {
    let container = Container::builder().mode(Mode::Strict).build().unwrap();
    container.register_type::<Pool>().unwrap();
    container.register_type::<Warmup>().unwrap();

    container.initialize_services().unwrap();

    let a = container.resolve::<Warmup>().unwrap();
    let b = container.resolve::<Warmup>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn missing_contract_binding_is_reported() {
    let container = Container::new();
    match container.resolve::<UserService>() {
        Err(SanduqError::NoImplementationGiven(e)) => {
            assert_eq!(e.requested, ServiceKey::of::<dyn Repository>());
            assert_eq!(e.required_by, Some(ServiceKey::of::<UserService>()));
        }
        other => panic!("Expected NoImplementationGiven, got: {:?}", other.is_ok()),
    }
}

#[test]
fn factories_of_derived_types() {
    let container = Container::new();
    let factory = container.resolve::<Factory<UserRepository>>().unwrap();
    let a = factory.create().unwrap();
    let b = factory.create().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a.pool, &b.pool));
}
