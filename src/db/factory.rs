use std::collections::BTreeMap;

use anyhow::{bail, Result};

use super::{basic::BasicDb, memory::MemoryDb, Db};
use crate::properties::Properties;

/// Constructor for one registered store backend.
pub type DbConstructor = Box<dyn Fn(&Properties) -> Result<Box<dyn Db>> + Send + Sync>;

/// Explicit name-to-backend registry.
///
/// Backends are registered by the driver at start-up; there is no global
/// registration, so a process owns exactly the registrations it made.
#[derive(Default)]
pub struct DbFactory {
    constructors: BTreeMap<String, DbConstructor>,
}

impl DbFactory {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under `name`, replacing any previous registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: impl Fn(&Properties) -> Result<Box<dyn Db>> + Send + Sync + 'static,
    ) {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Create a fresh handle of the backend registered under `name`.
    pub fn create(&self, name: &str, props: &Properties) -> Result<Box<dyn Db>> {
        match self.constructors.get(name) {
            Some(constructor) => constructor(props),
            None => bail!(
                "unknown store backend {name:?}; registered: {:?}",
                self.constructors.keys().collect::<Vec<_>>()
            ),
        }
    }

    /// Names of all registered backends.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

/// Register the built-in backends.
///
/// `basic` logs every call; `memory` is an in-memory store whose handles all
/// share the tables created here, so one process-wide store serves every
/// worker across both phases.
pub fn register_builtin(factory: &mut DbFactory) {
    factory.register("basic", |_| Ok(Box::new(BasicDb::new()) as Box<dyn Db>));

    let shared = MemoryDb::new();
    factory.register("memory", move |_| {
        Ok(Box::new(shared.clone()) as Box<dyn Db>)
    });
}
