//! Extension registry core.
//! Declares extension points, registers named implementations and builds
//! them from typed, validated options.

pub mod extension;
pub mod logging;
pub mod option;

pub use extension::descriptor::{
    is_valid_identifier, DescriptorError, ExtensionDescription, ExtensionDescriptor,
    OptionDescription,
};
pub use extension::global;
pub use extension::implementation::{Extensible, Extension, Implementation};
pub use extension::registry::{ExtensionError, ExtensionPoint, ExtensionRegistry};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use option::coerce::{coerce, coerce_value, OptionError, OptionResult, OptionValues};
pub use option::spec::OptionSpec;
pub use option::value::{OptionType, OptionValue, RawOptions};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
