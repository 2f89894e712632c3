//! Raw option validation and type coercion.
//!
//! # Responsibility
//! - Turn a raw option mapping into typed values following an option schema.
//! - Reject missing required options and options outside the schema.
//!
//! # Invariants
//! - The schema is closed: every raw key must match one declared option.
//! - Coercion is deterministic and locale-free.
//! - Coercing an already-typed value returns it unchanged.

use crate::option::spec::OptionSpec;
use crate::option::value::{OptionType, OptionValue, RawOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static INT_LITERAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("valid int literal regex"));
static FLOAT_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("valid float literal regex")
});

const TRUE_LITERALS: &[&str] = &["true", "1", "yes", "on"];
const FALSE_LITERALS: &[&str] = &["false", "0", "no", "off"];

pub type OptionResult<T> = Result<T, OptionError>;

/// Option validation and coercion errors.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionError {
    /// A required option was not supplied.
    MissingRequired(String),
    /// Raw keys that match no declared option, sorted.
    Unknown(Vec<String>),
    /// A raw value could not be converted to the declared type.
    TypeCoercion {
        option: String,
        expected: OptionType,
        value: OptionValue,
    },
}

impl Display for OptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired(name) => write!(f, "missing required option: {name}"),
            Self::Unknown(names) => write!(f, "unknown options: {}", names.join(", ")),
            Self::TypeCoercion {
                option,
                expected,
                value,
            } => write!(
                f,
                "option `{option}` value {value} cannot be converted to {expected}"
            ),
        }
    }
}

impl Error for OptionError {}

/// Typed option values produced by [`coerce`], in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionValues {
    entries: Vec<(String, OptionValue)>,
}

impl OptionValues {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns one value by option name (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    /// Reads a `string` option.
    pub fn string(&self, name: &str) -> OptionResult<String> {
        self.typed(name, OptionType::String, |value| {
            value.as_str().map(str::to_string)
        })
    }

    /// Reads an `int` option.
    pub fn int(&self, name: &str) -> OptionResult<i64> {
        self.typed(name, OptionType::Int, OptionValue::as_int)
    }

    /// Reads a `float` option.
    pub fn float(&self, name: &str) -> OptionResult<f64> {
        self.typed(name, OptionType::Float, OptionValue::as_float)
    }

    /// Reads a `bool` option.
    pub fn bool(&self, name: &str) -> OptionResult<bool> {
        self.typed(name, OptionType::Bool, OptionValue::as_bool)
    }

    fn typed<T>(
        &self,
        name: &str,
        expected: OptionType,
        read: impl FnOnce(&OptionValue) -> Option<T>,
    ) -> OptionResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| OptionError::MissingRequired(name.to_string()))?;
        read(value).ok_or_else(|| OptionError::TypeCoercion {
            option: name.to_string(),
            expected,
            value: value.clone(),
        })
    }
}

impl IntoIterator for OptionValues {
    type Item = (String, OptionValue);
    type IntoIter = std::vec::IntoIter<(String, OptionValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Validates `raw` against `options` and converts every value to its
/// declared type.
///
/// Options are processed in declaration order. A supplied value wins over the
/// default; a missing option without default fails with
/// [`OptionError::MissingRequired`]. Keys of `raw` that no option consumed
/// are reported together as [`OptionError::Unknown`].
///
/// Raw keys are matched exactly first, then ASCII case-insensitively.
pub fn coerce(options: &[OptionSpec], raw: &RawOptions) -> OptionResult<OptionValues> {
    let mut consumed = BTreeSet::<&str>::new();
    let mut entries = Vec::with_capacity(options.len());

    for option in options {
        let key = match_raw_key(raw, option.name(), &consumed);
        let value = match key {
            Some(key) => {
                consumed.insert(key);
                coerce_value(option, &raw[key])?
            }
            None => match option.default() {
                Some(default) => default.clone(),
                None => return Err(OptionError::MissingRequired(option.name().to_string())),
            },
        };
        entries.push((option.name().to_string(), value));
    }

    let unknown: Vec<String> = raw
        .keys()
        .filter(|key| !consumed.contains(key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(OptionError::Unknown(unknown));
    }

    Ok(OptionValues { entries })
}

/// Converts one raw value to the type declared by `option`.
pub fn coerce_value(option: &OptionSpec, raw: &OptionValue) -> OptionResult<OptionValue> {
    let converted = match option.option_type() {
        OptionType::String => match raw {
            OptionValue::Str(_) => Some(raw.clone()),
            _ => None,
        },
        OptionType::Int => match raw {
            OptionValue::Int(_) => Some(raw.clone()),
            OptionValue::Str(text) => parse_int(text).map(OptionValue::Int),
            _ => None,
        },
        OptionType::Float => match raw {
            OptionValue::Float(_) => Some(raw.clone()),
            OptionValue::Int(value) => Some(OptionValue::Float(*value as f64)),
            OptionValue::Str(text) => parse_float(text).map(OptionValue::Float),
            OptionValue::Bool(_) => None,
        },
        OptionType::Bool => match raw {
            OptionValue::Bool(_) => Some(raw.clone()),
            OptionValue::Str(text) => parse_bool(text).map(OptionValue::Bool),
            _ => None,
        },
    };

    converted.ok_or_else(|| OptionError::TypeCoercion {
        option: option.name().to_string(),
        expected: option.option_type(),
        value: raw.clone(),
    })
}

fn match_raw_key<'a>(
    raw: &'a RawOptions,
    name: &str,
    consumed: &BTreeSet<&str>,
) -> Option<&'a str> {
    if let Some((key, _)) = raw.get_key_value(name) {
        if !consumed.contains(key.as_str()) {
            return Some(key.as_str());
        }
    }
    raw.keys()
        .map(String::as_str)
        .find(|key| !consumed.contains(key) && key.eq_ignore_ascii_case(name))
}

fn parse_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if !INT_LITERAL_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if !FLOAT_LITERAL_RE.is_match(trimmed) {
        return None;
    }
    // Overflowing literals such as `1e999` parse to infinity.
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    let normalized = text.trim().to_ascii_lowercase();
    if TRUE_LITERALS.contains(&normalized.as_str()) {
        Some(true)
    } else if FALSE_LITERALS.contains(&normalized.as_str()) {
        Some(false)
    } else {
        None
    }
}
