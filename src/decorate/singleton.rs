//! One instance per type.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use tracing::debug;

/// Lazily initialised value usable from a `static`.
///
/// ```
/// use magickit::decorate::Singleton;
///
/// static SETTINGS: Singleton<Vec<String>> = Singleton::new();
///
/// let first = SETTINGS.get_or_init(|| vec!["a".into()]);
/// let second = SETTINGS.get_or_init(|| vec!["b".into()]);
/// assert!(std::ptr::eq(first, second));
/// ```
#[derive(Debug)]
pub struct Singleton<T> {
    cell: OnceLock<T>,
}

impl<T> Singleton<T> {
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// The instance, created by `init` on first use.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(init)
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }
}

impl<T> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

type Registry = Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Process-wide instance of `T`; `init` only runs for the first caller.
///
/// `init` runs with the registry locked, so it must not call `singleton`
/// itself.
pub fn singleton<T, F>(init: F) -> Arc<T>
where
    T: Any + Send + Sync,
    F: FnOnce() -> T,
{
    let mut instances = registry().lock().unwrap_or_else(PoisonError::into_inner);
    let entry = instances.entry(TypeId::of::<T>()).or_insert_with(|| {
        debug!(type_name = std::any::type_name::<T>(), "creating singleton");
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(init());
        instance
    });
    match Arc::clone(entry).downcast::<T>() {
        Ok(instance) => instance,
        Err(_) => unreachable!("singleton registry is keyed by TypeId"),
    }
}
