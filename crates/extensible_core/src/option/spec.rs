//! Declarative option schema.

use crate::option::value::{OptionType, OptionValue};

/// Describes one constructor parameter of an extension implementation.
///
/// Built with a small builder:
///
/// ```
/// use extensible_core::{OptionSpec, OptionType};
///
/// let indent = OptionSpec::new("indent", OptionType::Int)
///     .with_default(4)
///     .with_label("Indentation");
/// assert!(!indent.is_required());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    name: String,
    option_type: OptionType,
    default: Option<OptionValue>,
    label: Option<String>,
    description: Option<String>,
}

impl OptionSpec {
    /// Creates a required option of `option_type`.
    pub fn new(name: impl Into<String>, option_type: OptionType) -> Self {
        Self {
            name: name.into(),
            option_type,
            default: None,
            label: None,
            description: None,
        }
    }

    /// Shorthand for a `string` option.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::String)
    }

    /// Shorthand for an `int` option.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Int)
    }

    /// Shorthand for a `float` option.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Float)
    }

    /// Shorthand for a `bool` option.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Bool)
    }

    /// Sets the default value, which makes the option optional.
    ///
    /// An integral default of a `float` option is widened. Any other type
    /// conflict is kept as declared and rejected at registration.
    pub fn with_default(mut self, default: impl Into<OptionValue>) -> Self {
        let default = default.into();
        self.default = match (self.option_type, default) {
            (OptionType::Float, OptionValue::Int(value)) => Some(OptionValue::Float(value as f64)),
            (_, other) => Some(other),
        };
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn default(&self) -> Option<&OptionValue> {
        self.default.as_ref()
    }

    /// Human readable label; falls back to the option name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Required iff no default is declared.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}
