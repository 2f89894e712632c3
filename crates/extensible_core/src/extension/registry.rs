//! Extension registry: lookup from `(extension_type, extension_name)` to
//! implementation.
//!
//! # Responsibility
//! - Declare extension points and bind each to one instance type.
//! - Register implementations explicitly and list them per point.
//! - Resolve and construct implementations from raw options.
//!
//! # Invariants
//! - Extension names are unique within one extension point.
//! - Failed registration leaves the registry unchanged.
//! - The registry stores factories, never instances.

use crate::extension::descriptor::{
    is_valid_identifier, DescriptorError, ExtensionDescription, ExtensionDescriptor,
};
use crate::extension::implementation::{Extensible, Extension, Implementation};
use crate::option::coerce::OptionError;
use crate::option::value::RawOptions;
use log::{debug, info, warn};
use std::any::{type_name, Any, TypeId};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;

/// Typed handle of one declared extension point.
///
/// Two handles are equal when they name the same extension type.
pub struct ExtensionPoint<T: ?Sized> {
    extension_type: String,
    _instance: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + 'static> ExtensionPoint<T> {
    fn new(extension_type: String) -> Self {
        Self {
            extension_type,
            _instance: PhantomData,
        }
    }

    pub fn extension_type(&self) -> &str {
        &self.extension_type
    }

    /// Looks up one implementation of this point in `registry`.
    pub fn lookup(
        &self,
        registry: &ExtensionRegistry,
        extension_name: &str,
    ) -> Result<Implementation<T>, ExtensionError> {
        registry.lookup(&self.extension_type, extension_name)
    }

    /// Lists implementation names of this point in registration order.
    pub fn list_names(&self, registry: &ExtensionRegistry) -> Result<Vec<String>, ExtensionError> {
        registry.list_names(&self.extension_type)
    }

    /// Builds one implementation of this point from raw options.
    pub fn create(
        &self,
        registry: &ExtensionRegistry,
        extension_name: &str,
        raw: &RawOptions,
    ) -> Result<Box<T>, ExtensionError> {
        registry.create(&self.extension_type, extension_name, raw)
    }
}

impl<T: ?Sized> Clone for ExtensionPoint<T> {
    fn clone(&self) -> Self {
        Self {
            extension_type: self.extension_type.clone(),
            _instance: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for ExtensionPoint<T> {
    fn eq(&self, other: &Self) -> bool {
        self.extension_type == other.extension_type
    }
}

impl<T: ?Sized> Eq for ExtensionPoint<T> {}

impl<T: ?Sized> Debug for ExtensionPoint<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionPoint")
            .field("extension_type", &self.extension_type)
            .field("instance", &type_name::<T>())
            .finish()
    }
}

#[derive(Debug)]
struct RegisteredExtension {
    descriptor: ExtensionDescriptor,
    /// Holds an `Implementation<T>` of the point's instance type.
    implementation: Box<dyn Any + Send + Sync>,
}

#[derive(Debug)]
struct PointTable {
    instance_type: TypeId,
    instance_type_name: &'static str,
    entries: Vec<RegisteredExtension>,
    index: BTreeMap<String, usize>,
}

impl PointTable {
    fn new<T: ?Sized + 'static>() -> Self {
        Self {
            instance_type: TypeId::of::<T>(),
            instance_type_name: type_name::<T>(),
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.name.clone())
            .collect()
    }

    fn ensure_instance_type<T: ?Sized + 'static>(
        &self,
        extension_type: &str,
    ) -> Result<(), ExtensionError> {
        if self.instance_type == TypeId::of::<T>() {
            return Ok(());
        }
        Err(ExtensionError::InstanceTypeMismatch {
            extension_type: extension_type.to_string(),
            declared: self.instance_type_name,
            requested: type_name::<T>(),
        })
    }

    fn entry(
        &self,
        extension_type: &str,
        extension_name: &str,
    ) -> Result<&RegisteredExtension, ExtensionError> {
        match self.index.get(extension_name) {
            Some(position) => Ok(&self.entries[*position]),
            None => Err(ExtensionError::UnknownExtension {
                extension_type: extension_type.to_string(),
                extension_name: extension_name.to_string(),
                available: self.names(),
            }),
        }
    }
}

/// In-process catalog of extension points and their implementations.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    points: BTreeMap<String, PointTable>,
    declaration_order: Vec<String>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares extension point `extension_type` producing instances of `T`.
    ///
    /// Idempotent: declaring the same type again returns an equal handle.
    ///
    /// # Errors
    /// - `InvalidExtensionType` when the identifier is empty or malformed.
    /// - `InstanceTypeMismatch` when the type is bound to another `T`.
    pub fn declare_extension_point<T: ?Sized + 'static>(
        &mut self,
        extension_type: &str,
    ) -> Result<ExtensionPoint<T>, ExtensionError> {
        let extension_type = normalize_extension_type(extension_type)?;
        self.point_table_mut::<T>(&extension_type)?;
        Ok(ExtensionPoint::new(extension_type))
    }

    /// Registers `implementation` under `extension_type`.
    ///
    /// The extension point is declared implicitly on first use.
    ///
    /// # Errors
    /// - `InvalidExtensionType` / `InstanceTypeMismatch` as for declaration.
    /// - `InvalidDescriptor` when name or option schema is malformed.
    /// - `DuplicateExtension` when the name is already taken.
    pub fn register<T: ?Sized + 'static>(
        &mut self,
        extension_type: &str,
        implementation: Implementation<T>,
    ) -> Result<(), ExtensionError> {
        let extension_type = normalize_extension_type(extension_type)?;
        implementation
            .descriptor()
            .validate()
            .map_err(ExtensionError::InvalidDescriptor)?;

        let table = self.point_table_mut::<T>(&extension_type)?;
        let extension_name = implementation.name().to_string();
        if table.index.contains_key(extension_name.as_str()) {
            warn!(
                "event=extension_register module=registry status=error error_code=duplicate_extension extension_type={} extension_name={}",
                extension_type, extension_name
            );
            return Err(ExtensionError::DuplicateExtension {
                extension_type,
                extension_name,
            });
        }

        table.index.insert(extension_name.clone(), table.entries.len());
        table.entries.push(RegisteredExtension {
            descriptor: implementation.descriptor().clone(),
            implementation: Box::new(implementation),
        });
        info!(
            "event=extension_register module=registry status=ok extension_type={} extension_name={}",
            extension_type, extension_name
        );
        Ok(())
    }

    /// Registers the implementation declared by extension type `E`.
    pub fn register_extension<E: Extension>(&mut self) -> Result<(), ExtensionError> {
        self.register(
            <E::Point as Extensible>::EXTENSION_TYPE,
            Implementation::<E::Point>::of::<E>(),
        )
    }

    /// Resolves implementation `extension_name` of `extension_type`.
    ///
    /// # Errors
    /// - `UnknownExtensionType` when the type was never declared.
    /// - `UnknownExtension` (with available names) when the name is unknown.
    /// - `InstanceTypeMismatch` when `T` is not the point's instance type.
    pub fn lookup<T: ?Sized + 'static>(
        &self,
        extension_type: &str,
        extension_name: &str,
    ) -> Result<Implementation<T>, ExtensionError> {
        let extension_type = extension_type.trim();
        let table = self.point_table(extension_type)?;
        table.ensure_instance_type::<T>(extension_type)?;
        let entry = table.entry(extension_type, extension_name.trim())?;

        entry
            .implementation
            .downcast_ref::<Implementation<T>>()
            .cloned()
            .ok_or_else(|| ExtensionError::InstanceTypeMismatch {
                extension_type: extension_type.to_string(),
                declared: table.instance_type_name,
                requested: type_name::<T>(),
            })
    }

    /// Resolves an implementation of the statically declared point `P`.
    pub fn lookup_extension<P: Extensible + ?Sized>(
        &self,
        extension_name: &str,
    ) -> Result<Implementation<P>, ExtensionError> {
        self.lookup(P::EXTENSION_TYPE, extension_name)
    }

    /// Returns implementation names of `extension_type` in registration order.
    pub fn list_names(&self, extension_type: &str) -> Result<Vec<String>, ExtensionError> {
        Ok(self.point_table(extension_type.trim())?.names())
    }

    /// Returns declared extension types in declaration order.
    pub fn extension_types(&self) -> Vec<String> {
        self.declaration_order.clone()
    }

    pub fn contains(&self, extension_type: &str, extension_name: &str) -> bool {
        self.points
            .get(extension_type.trim())
            .is_some_and(|table| table.index.contains_key(extension_name.trim()))
    }

    /// Returns a structured description of one registered implementation.
    pub fn describe(
        &self,
        extension_type: &str,
        extension_name: &str,
    ) -> Result<ExtensionDescription, ExtensionError> {
        let extension_type = extension_type.trim();
        let entry = self
            .point_table(extension_type)?
            .entry(extension_type, extension_name.trim())?;
        Ok(entry.descriptor.describe(extension_type))
    }

    /// Looks up, coerces `raw`, then constructs one instance.
    ///
    /// Lookup and coercion complete before the factory is invoked.
    pub fn create<T: ?Sized + 'static>(
        &self,
        extension_type: &str,
        extension_name: &str,
        raw: &RawOptions,
    ) -> Result<Box<T>, ExtensionError> {
        let implementation = self.lookup::<T>(extension_type, extension_name)?;
        create_instance(extension_type.trim(), &implementation, raw)
    }

    /// Constructs an implementation of the statically declared point `P`.
    pub fn create_extension<P: Extensible + ?Sized>(
        &self,
        extension_name: &str,
        raw: &RawOptions,
    ) -> Result<Box<P>, ExtensionError> {
        self.create(P::EXTENSION_TYPE, extension_name, raw)
    }

    fn point_table(&self, extension_type: &str) -> Result<&PointTable, ExtensionError> {
        self.points
            .get(extension_type)
            .ok_or_else(|| ExtensionError::UnknownExtensionType(extension_type.to_string()))
    }

    fn point_table_mut<T: ?Sized + 'static>(
        &mut self,
        extension_type: &str,
    ) -> Result<&mut PointTable, ExtensionError> {
        let table = match self.points.entry(extension_type.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.declaration_order.push(extension_type.to_string());
                debug!(
                    "event=extension_point_declare module=registry status=ok extension_type={} instance={}",
                    extension_type,
                    type_name::<T>()
                );
                entry.insert(PointTable::new::<T>())
            }
        };
        table.ensure_instance_type::<T>(extension_type)?;
        Ok(table)
    }
}

/// Coerces `raw` and invokes the factory of `implementation`.
pub(crate) fn create_instance<T: ?Sized>(
    extension_type: &str,
    implementation: &Implementation<T>,
    raw: &RawOptions,
) -> Result<Box<T>, ExtensionError> {
    match implementation.create(raw) {
        Ok(instance) => {
            debug!(
                "event=extension_create module=registry status=ok extension_type={} extension_name={} option_count={}",
                extension_type,
                implementation.name(),
                raw.len()
            );
            Ok(instance)
        }
        Err(err) => {
            warn!(
                "event=extension_create module=registry status=error extension_type={} extension_name={} error={}",
                extension_type,
                implementation.name(),
                err
            );
            Err(err.into())
        }
    }
}

fn normalize_extension_type(extension_type: &str) -> Result<String, ExtensionError> {
    let trimmed = extension_type.trim();
    if !is_valid_identifier(trimmed) {
        return Err(ExtensionError::InvalidExtensionType(
            extension_type.to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Registry lookup, registration and construction errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionError {
    /// Extension type identifier is empty or malformed.
    InvalidExtensionType(String),
    /// Extension type is bound to another instance type.
    InstanceTypeMismatch {
        extension_type: String,
        declared: &'static str,
        requested: &'static str,
    },
    /// Implementation declaration is malformed.
    InvalidDescriptor(DescriptorError),
    DuplicateExtension {
        extension_type: String,
        extension_name: String,
    },
    UnknownExtensionType(String),
    UnknownExtension {
        extension_type: String,
        extension_name: String,
        /// Registered names of the type, in registration order.
        available: Vec<String>,
    },
    /// Raw options failed validation or coercion.
    InvalidOptions(OptionError),
}

impl ExtensionError {
    /// Returns whether the error stems from a bad declaration rather than a
    /// bad lookup or bad options.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidExtensionType(_)
                | Self::InstanceTypeMismatch { .. }
                | Self::InvalidDescriptor(_)
        )
    }
}

impl Display for ExtensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidExtensionType(value) => {
                write!(f, "extension type is invalid: {value:?}")
            }
            Self::InstanceTypeMismatch {
                extension_type,
                declared,
                requested,
            } => write!(
                f,
                "extension type `{extension_type}` produces `{declared}`, not `{requested}`"
            ),
            Self::InvalidDescriptor(err) => write!(f, "invalid extension declaration: {err}"),
            Self::DuplicateExtension {
                extension_type,
                extension_name,
            } => write!(
                f,
                "extension already registered: {extension_type}/{extension_name}"
            ),
            Self::UnknownExtensionType(value) => write!(f, "unknown extension type: {value}"),
            Self::UnknownExtension {
                extension_type,
                extension_name,
                available,
            } => write!(
                f,
                "unknown extension `{extension_name}` of type `{extension_type}` (available: {})",
                available.join(", ")
            ),
            Self::InvalidOptions(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExtensionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDescriptor(err) => Some(err),
            Self::InvalidOptions(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OptionError> for ExtensionError {
    fn from(value: OptionError) -> Self {
        Self::InvalidOptions(value)
    }
}
