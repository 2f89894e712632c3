//! Extension implementation handles and declaration traits.
//!
//! # Responsibility
//! - Pair an extension descriptor with the factory that builds instances.
//! - Offer a trait-based declaration path for concrete extension types.
//!
//! # Invariants
//! - Factories only ever receive fully coerced option values.
//! - Handles are cheap to clone and never own instances.

use crate::extension::descriptor::ExtensionDescriptor;
use crate::option::coerce::{coerce, OptionResult, OptionValues};
use crate::option::spec::OptionSpec;
use crate::option::value::RawOptions;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Abstract capability that implementations register under.
///
/// Usually implemented for a trait object:
///
/// ```
/// use extensible_core::Extensible;
///
/// pub trait Printer {
///     fn print(&self, text: &str) -> String;
/// }
///
/// impl Extensible for dyn Printer {
///     const EXTENSION_TYPE: &'static str = "printer";
/// }
/// ```
pub trait Extensible: 'static {
    const EXTENSION_TYPE: &'static str;
}

/// Concrete extension declared with associated items instead of a builder.
///
/// Registered with `ExtensionRegistry::register_extension::<E>()`.
pub trait Extension: 'static {
    /// Extension point the implementation belongs to.
    type Point: Extensible + ?Sized;

    /// Unique name within `Point::EXTENSION_TYPE`; a lowercase identifier
    /// as accepted by [`is_valid_identifier`](crate::is_valid_identifier).
    const EXTENSION_NAME: &'static str;

    fn options() -> Vec<OptionSpec> {
        Vec::new()
    }

    fn label() -> Option<&'static str> {
        None
    }

    fn description() -> Option<&'static str> {
        None
    }

    /// Builds an instance from coerced option values.
    fn from_options(options: &OptionValues) -> OptionResult<Box<Self::Point>>;
}

/// Registered implementation of extension point `T`.
pub struct Implementation<T: ?Sized> {
    descriptor: ExtensionDescriptor,
    factory: Arc<dyn Fn(&OptionValues) -> OptionResult<Box<T>> + Send + Sync>,
}

impl<T: ?Sized + 'static> Implementation<T> {
    /// Creates an implementation named `name` without options.
    ///
    /// `name` must be a lowercase identifier, see
    /// [`is_valid_identifier`](crate::is_valid_identifier). A name like
    /// `SQLStore` is accepted here but registration fails with
    /// [`ExtensionError::InvalidDescriptor`](crate::ExtensionError::InvalidDescriptor).
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&OptionValues) -> OptionResult<Box<T>> + Send + Sync + 'static,
    {
        Self {
            descriptor: ExtensionDescriptor::new(name),
            factory: Arc::new(factory),
        }
    }

    /// Builds the implementation declared by extension type `E`.
    pub fn of<E>() -> Self
    where
        E: Extension<Point = T>,
        T: Extensible,
    {
        let mut implementation = Self::new(E::EXTENSION_NAME, E::from_options);
        implementation.descriptor.options = E::options();
        implementation.descriptor.label = E::label().map(str::to_string);
        implementation.descriptor.description = E::description().map(str::to_string);
        implementation
    }

    pub fn with_option(mut self, option: OptionSpec) -> Self {
        self.descriptor.options.push(option);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.descriptor.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = Some(description.into());
        self
    }
}

impl<T: ?Sized> Implementation<T> {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &ExtensionDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.descriptor.options
    }

    /// Validates and converts `raw` against this implementation's options.
    pub fn coerce(&self, raw: &RawOptions) -> OptionResult<OptionValues> {
        coerce(&self.descriptor.options, raw)
    }

    /// Invokes the factory with already coerced values.
    pub fn instantiate(&self, values: &OptionValues) -> OptionResult<Box<T>> {
        (self.factory)(values)
    }

    /// Coerces `raw` completely, then builds an instance.
    pub fn create(&self, raw: &RawOptions) -> OptionResult<Box<T>> {
        let values = self.coerce(raw)?;
        self.instantiate(&values)
    }
}

impl<T: ?Sized> Clone for Implementation<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T: ?Sized> Debug for Implementation<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implementation")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Extensible, Extension, Implementation};
    use crate::option::coerce::{OptionError, OptionResult, OptionValues};
    use crate::option::spec::OptionSpec;
    use crate::option::value::{OptionValue, RawOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    trait Greeter {
        fn greet(&self) -> String;
    }

    impl Extensible for dyn Greeter {
        const EXTENSION_TYPE: &'static str = "greeter";
    }

    struct Polite {
        name: String,
        excited: bool,
    }

    impl Greeter for Polite {
        fn greet(&self) -> String {
            let mark = if self.excited { "!" } else { "." };
            format!("Good day, {}{mark}", self.name)
        }
    }

    impl Extension for Polite {
        type Point = dyn Greeter;
        const EXTENSION_NAME: &'static str = "polite";

        fn options() -> Vec<OptionSpec> {
            vec![
                OptionSpec::string("name"),
                OptionSpec::bool("excited").with_default(false),
            ]
        }

        fn label() -> Option<&'static str> {
            Some("Polite greeter")
        }

        fn from_options(options: &OptionValues) -> OptionResult<Box<dyn Greeter>> {
            Ok(Box::new(Polite {
                name: options.string("name")?,
                excited: options.bool("excited")?,
            }))
        }
    }

    #[test]
    fn builds_implementation_from_extension_trait() {
        let implementation = Implementation::<dyn Greeter>::of::<Polite>();
        assert_eq!(implementation.name(), "polite");
        assert_eq!(implementation.options().len(), 2);
        assert_eq!(
            implementation.descriptor().label.as_deref(),
            Some("Polite greeter")
        );

        let mut raw = RawOptions::new();
        raw.insert("name".to_string(), OptionValue::from("Ada"));
        raw.insert("excited".to_string(), OptionValue::from("yes"));
        let greeter = implementation.create(&raw).expect("greeter should build");
        assert_eq!(greeter.greet(), "Good day, Ada!");
    }

    #[test]
    fn does_not_invoke_factory_when_coercion_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let implementation = Implementation::<dyn Greeter>::new("counting", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Polite {
                name: "x".to_string(),
                excited: false,
            }) as Box<dyn Greeter>)
        })
        .with_option(OptionSpec::int("retries"));

        let err = implementation
            .create(&RawOptions::new())
            .err()
            .expect("missing option must fail");
        assert_eq!(err, OptionError::MissingRequired("retries".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clones_share_factory() {
        let implementation = Implementation::<dyn Greeter>::of::<Polite>();
        let copy = implementation.clone();
        assert_eq!(copy.descriptor(), implementation.descriptor());
    }
}
