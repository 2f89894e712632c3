//! Extension descriptor declaration and validation.

use crate::option::spec::OptionSpec;
use crate::option::value::{OptionType, OptionValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("valid identifier regex")
});
static OPTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid option name regex"));

/// Returns whether `value` is a valid extension type or extension name.
///
/// Identifiers are lowercase ASCII alphanumeric segments joined by single
/// `.`, `_` or `-` separators, e.g. `printer`, `store.sql`, `json-lines`.
/// Names such as `SQLStore` or `pretty printer` are rejected, and
/// registering them fails with `InvalidDescriptor(InvalidName)`.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

/// Static declaration of one extension implementation.
///
/// Replaces runtime class introspection: name, documentation and option
/// schema are spelled out when the implementation is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionDescriptor {
    /// Unique name within the extension type, e.g. `pretty`. Must pass
    /// [`is_valid_identifier`].
    pub name: String,
    /// Human readable name; the extension name is used when absent.
    pub label: Option<String>,
    /// Free-form documentation shown in help output.
    pub description: Option<String>,
    /// Constructor parameters, in declaration order.
    pub options: Vec<OptionSpec>,
}

impl ExtensionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            options: Vec::new(),
        }
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if !is_valid_identifier(&self.name) {
            return Err(DescriptorError::InvalidName(self.name.clone()));
        }

        let mut seen = BTreeSet::<String>::new();
        for option in &self.options {
            if !OPTION_NAME_RE.is_match(option.name()) {
                return Err(DescriptorError::InvalidOptionName(
                    option.name().to_string(),
                ));
            }
            // Raw keys match case-insensitively, so names must differ beyond case.
            if !seen.insert(option.name().to_ascii_lowercase()) {
                return Err(DescriptorError::DuplicateOption(option.name().to_string()));
            }
            if let Some(default) = option.default() {
                if default.option_type() != option.option_type() {
                    return Err(DescriptorError::DefaultTypeMismatch {
                        option: option.name().to_string(),
                        expected: option.option_type(),
                        found: default.option_type(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the help-oriented description of this implementation.
    pub fn describe(&self, extension_type: &str) -> ExtensionDescription {
        ExtensionDescription {
            extension_type: extension_type.to_string(),
            name: self.name.clone(),
            label: self.label.clone().unwrap_or_else(|| self.name.clone()),
            doc: self
                .description
                .clone()
                .unwrap_or_else(|| NO_DOCUMENTATION.to_string()),
            options: self
                .options
                .iter()
                .map(|option| OptionDescription {
                    name: option.name().to_string(),
                    label: option.label().to_string(),
                    option_type: option.option_type(),
                    default: option.default().cloned(),
                    required: option.is_required(),
                    description: option.description().map(str::to_string),
                })
                .collect(),
        }
    }
}

const NO_DOCUMENTATION: &str = "(No documentation)";

/// Structured description of one registered extension.
///
/// Meant for help text and validation UIs built outside the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionDescription {
    #[serde(rename = "type")]
    pub extension_type: String,
    pub name: String,
    pub label: String,
    pub doc: String,
    pub options: Vec<OptionDescription>,
}

/// Description of one option within an [`ExtensionDescription`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDescription {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub default: Option<OptionValue>,
    pub required: bool,
    pub description: Option<String>,
}

/// Descriptor validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    InvalidName(String),
    InvalidOptionName(String),
    DuplicateOption(String),
    DefaultTypeMismatch {
        option: String,
        expected: OptionType,
        found: OptionType,
    },
}

impl Display for DescriptorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "extension name is invalid: {value:?}"),
            Self::InvalidOptionName(value) => write!(f, "option name is invalid: {value:?}"),
            Self::DuplicateOption(value) => write!(f, "option is declared twice: {value}"),
            Self::DefaultTypeMismatch {
                option,
                expected,
                found,
            } => write!(
                f,
                "default of option `{option}` is {found}, expected {expected}"
            ),
        }
    }
}

impl Error for DescriptorError {}
