//! Process-wide extension registry.
//!
//! # Responsibility
//! - Hold one registry shared by the whole process.
//! - Serialize registration behind a write lock; lookups share a read lock.
//!
//! # Invariants
//! - Factories run outside the lock, so a factory may itself use the
//!   registry.
//! - A poisoned lock is recovered; registry mutations are all-or-nothing.

use crate::extension::descriptor::ExtensionDescription;
use crate::extension::implementation::{Extensible, Extension, Implementation};
use crate::extension::registry::{
    create_instance, ExtensionError, ExtensionPoint, ExtensionRegistry,
};
use crate::option::value::RawOptions;
use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

static GLOBAL_REGISTRY: Lazy<RwLock<ExtensionRegistry>> =
    Lazy::new(|| RwLock::new(ExtensionRegistry::new()));

fn read_registry() -> RwLockReadGuard<'static, ExtensionRegistry> {
    GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

fn write_registry() -> RwLockWriteGuard<'static, ExtensionRegistry> {
    GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Runs `f` against the shared registry under the read lock.
pub fn with_registry<R>(f: impl FnOnce(&ExtensionRegistry) -> R) -> R {
    f(&read_registry())
}

pub fn declare_extension_point<T: ?Sized + 'static>(
    extension_type: &str,
) -> Result<ExtensionPoint<T>, ExtensionError> {
    write_registry().declare_extension_point(extension_type)
}

pub fn register<T: ?Sized + 'static>(
    extension_type: &str,
    implementation: Implementation<T>,
) -> Result<(), ExtensionError> {
    write_registry().register(extension_type, implementation)
}

pub fn register_extension<E: Extension>() -> Result<(), ExtensionError> {
    write_registry().register_extension::<E>()
}

pub fn lookup<T: ?Sized + 'static>(
    extension_type: &str,
    extension_name: &str,
) -> Result<Implementation<T>, ExtensionError> {
    read_registry().lookup(extension_type, extension_name)
}

pub fn list_names(extension_type: &str) -> Result<Vec<String>, ExtensionError> {
    read_registry().list_names(extension_type)
}

pub fn extension_types() -> Vec<String> {
    read_registry().extension_types()
}

pub fn describe(
    extension_type: &str,
    extension_name: &str,
) -> Result<ExtensionDescription, ExtensionError> {
    read_registry().describe(extension_type, extension_name)
}

/// Looks up under the read lock, then coerces and constructs without it.
pub fn create<T: ?Sized + 'static>(
    extension_type: &str,
    extension_name: &str,
    raw: &RawOptions,
) -> Result<Box<T>, ExtensionError> {
    let implementation = lookup::<T>(extension_type, extension_name)?;
    create_instance(extension_type.trim(), &implementation, raw)
}

pub fn create_extension<P: Extensible + ?Sized>(
    extension_name: &str,
    raw: &RawOptions,
) -> Result<Box<P>, ExtensionError> {
    create(P::EXTENSION_TYPE, extension_name, raw)
}

#[cfg(test)]
mod tests {
    use super::{create, list_names, lookup, register, with_registry};
    use crate::extension::implementation::Implementation;
    use crate::extension::registry::ExtensionError;
    use crate::option::value::RawOptions;
    use std::thread;

    // Process-wide state is shared by every unit test; names stay unique here.
    const TEST_TYPE: &str = "global-unit.reentrant";
    const THREADED_TYPE: &str = "global-unit.threaded";

    #[test]
    fn factory_can_read_registry_during_create() {
        register(
            TEST_TYPE,
            Implementation::<usize>::new("count", |_| {
                let count = list_names(TEST_TYPE).map(|names| names.len()).unwrap_or(0);
                Ok(Box::new(count))
            }),
        )
        .expect("registration");

        let count = create::<usize>(TEST_TYPE, "count", &RawOptions::new()).expect("create");
        assert_eq!(*count, 1);
        assert!(with_registry(|registry| registry.contains(TEST_TYPE, "count")));
        assert!(matches!(
            lookup::<usize>(TEST_TYPE, "other"),
            Err(ExtensionError::UnknownExtension { .. })
        ));
    }

    #[test]
    fn registers_from_many_threads() {
        let workers: Vec<_> = (0..16)
            .map(|index| {
                thread::spawn(move || {
                    register(
                        THREADED_TYPE,
                        Implementation::<usize>::new(format!("worker-{index}"), move |_| {
                            Ok(Box::new(index))
                        }),
                    )
                })
            })
            .collect();
        for worker in workers {
            worker
                .join()
                .expect("worker thread")
                .expect("registration");
        }

        let mut names = list_names(THREADED_TYPE).expect("threaded type");
        names.sort();
        let mut expected: Vec<String> = (0..16).map(|index| format!("worker-{index}")).collect();
        expected.sort();
        assert_eq!(names, expected);

        let worker =
            create::<usize>(THREADED_TYPE, "worker-7", &RawOptions::new()).expect("create");
        assert_eq!(*worker, 7);
    }
}
