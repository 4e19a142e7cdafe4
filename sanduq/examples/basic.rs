//! Basic example of the Sanduq DI container.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sanduq::logging::init_tracing;
use sanduq::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

impl Injectable for dyn Logger {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::contract::<dyn Logger>()
    }
}

#[derive(Injectable)]
#[injectable(implements = "dyn Logger")]
struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
}

impl Injectable for Config {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::opaque::<Config>()
    }
}

#[derive(Injectable)]
#[injectable(singleton, disposable)]
struct Database {
    config: Arc<Config>,
    logger: Arc<dyn Logger>,
    #[inject(default)]
    queries: AtomicU64,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.config.database_url)
    }
}

impl Dispose for Database {
    fn dispose(&self) {
        self.logger
            .log(&format!("Closing database after {} queries", self.queries.load(Ordering::Relaxed)));
    }
}

#[derive(Injectable)]
struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

#[derive(Injectable)]
struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

// === Group registrations in a provider ===

struct InfrastructureProvider;

impl Provider for InfrastructureProvider {
    fn register(&self, container: &Container) -> Result<()> {
        container.register_value(Config {
            database_url: "postgres://localhost/myapp".to_string(),
        })?;
        container.register_implementation::<dyn Logger, ConsoleLogger>(Lifecycle::Singleton)?;
        container.register_type::<Database>()
    }
}

fn main() -> Result<()> {
    init_tracing("sanduq=debug");

    let container = Container::builder()
        .provider(InfrastructureProvider)
        .build()?;

    // UserService and UserRepository were never registered; they are built
    // from their derived constructors.
    let service = container.resolve::<UserService>()?;
    println!("{}", service.get_user(42));

    // Factory: a fresh repository per call, sharing the singleton database.
    let repositories = container.resolve::<Factory<UserRepository>>()?;
    let a = repositories.create()?;
    let b = repositories.create()?;
    println!("Same database: {}", Arc::ptr_eq(&a.db, &b.db));

    // Lazy: nothing is built until first access.
    let lazy = container.resolve::<Lazy<UserService>>()?;
    println!("Lazy initialised: {}", lazy.is_initialized());
    println!("{}", lazy.get()?.get_user(7));

    // Many: every binding of a contract.
    let loggers = container.resolve::<Many<dyn Logger>>()?;
    println!("Loggers bound: {}", loggers.len());

    // A child sees its parent's bindings; its own stay local.
    let request = container.create_child();
    request.register_value(String::from("request-17"))?;
    println!("Child resolves: {}", request.resolve::<UserService>()?.get_user(1));
    println!("Parent sees child binding: {}", container.resolve::<String>().is_ok());

    container.set_mode(Mode::Locked)?;
    if let Err(err) = container.register_value(8080u16) {
        println!("{err}");
    }

    container.dispose();
    Ok(())
}
