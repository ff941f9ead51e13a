//! Per-type deserializer factory resolution.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use crate::error::{BindError, BindErrorKind};
use crate::event::XmlRead;
use crate::tracing_macros::trace;

/// Builds values of `T` from a positioned reader.
///
/// Factories are stateless: a single instance is resolved once per target
/// type and may be invoked any number of times, from the element's start
/// event to (at most) its end event.
pub trait DeserializerFactory<T> {
    /// Build a value from a cursor positioned on the value's start element.
    fn deserialize(&self, reader: &mut dyn XmlRead) -> Result<T, BindError>;
}

impl<T> std::fmt::Debug for dyn DeserializerFactory<T> + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DeserializerFactory")
    }
}

/// Declares which factory constructs a type.
///
/// This is the type marker: registering `T` through
/// [`FactoryRegistry::register_type`] performs the factory's no-argument
/// construction path (`Default`).
pub trait XmlDeserialize: Sized + 'static {
    /// The factory responsible for this type.
    type Factory: DeserializerFactory<Self> + Default + Send + Sync + 'static;
}

/// An explicit type-to-factory table, built at startup.
///
/// Resolution never constructs anything: a missing registration is a wiring
/// defect reported as a configuration error. The registry itself is
/// unsynchronized; callers that share it across threads wrap it themselves.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<TypeId, Registration>,
}

struct Registration {
    type_name: &'static str,
    factory: Box<dyn Any + Send + Sync>,
}

impl FactoryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory instance for `T`.
    ///
    /// Registering a type twice is a configuration error: wiring is built
    /// once, at startup, and silent replacement would hide the defect.
    pub fn register<T, F>(&mut self, factory: F) -> Result<(), BindError>
    where
        T: 'static,
        F: DeserializerFactory<T> + Send + Sync + 'static,
    {
        let type_name = type_name::<T>();
        if self.factories.contains_key(&TypeId::of::<T>()) {
            return Err(BindError::new(BindErrorKind::DuplicateFactory { type_name }));
        }
        trace!(type_name, "registering deserializer factory");

        let boxed: Box<dyn DeserializerFactory<T> + Send + Sync> = Box::new(factory);
        self.factories.insert(
            TypeId::of::<T>(),
            Registration {
                type_name,
                factory: Box::new(boxed),
            },
        );
        Ok(())
    }

    /// Register `T` through its declared factory marker.
    pub fn register_type<T: XmlDeserialize>(&mut self) -> Result<(), BindError> {
        self.register::<T, T::Factory>(T::Factory::default())
    }

    /// True if a factory for `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
    }

    /// Resolve the factory for `T`.
    pub fn resolve<T: 'static>(&self) -> Result<&dyn DeserializerFactory<T>, BindError> {
        let registration = self.factories.get(&TypeId::of::<T>()).ok_or_else(|| {
            BindError::new(BindErrorKind::MissingFactory {
                type_name: type_name::<T>(),
            })
        })?;
        let factory = registration
            .factory
            .downcast_ref::<Box<dyn DeserializerFactory<T> + Send + Sync>>()
            .unwrap_or_else(|| {
                // the map is keyed by TypeId, so the stored box always matches
                unreachable!("registration for {} has wrong type", registration.type_name)
            });
        Ok(factory.as_ref())
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.factories.values().map(|r| r.type_name).collect();
        names.sort_unstable();
        f.debug_struct("FactoryRegistry")
            .field("registered", &names)
            .finish()
    }
}
