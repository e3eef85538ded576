//! Value normalizer - turns raw layer values into canonical typed values
//!
//! All functions here are pure. They report a [`Rejected`] value rather than
//! a full [`Error`] because only the resolver knows which option and layer
//! the value came from.

use crate::error::Error;
use crate::types::{Layer, RawValue, TriState};
use std::collections::BTreeMap;

/// A raw value that does not fit the shape an option requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub expected: &'static str,
    pub found: String,
}

impl Rejected {
    fn new(expected: &'static str, raw: &RawValue) -> Self {
        Self {
            expected,
            found: format!("{} {raw}", raw.type_name()),
        }
    }

    /// Attach the option and layer the value was found at
    pub fn at(self, option: &str, layer: Layer) -> Error {
        Error::invalid_value(option, layer, self.expected, self.found)
    }
}

/// Normalize a boolean-like value into a [`TriState`]
///
/// Accepts native booleans and the strings `true`/`yes`/`false`/`no` in any
/// case. Missing or blank values are `Unset`. Anything else is rejected.
pub fn normalize(raw: Option<&RawValue>) -> Result<TriState, Rejected> {
    let Some(raw) = raw else {
        return Ok(TriState::Unset);
    };

    match raw {
        RawValue::Bool(b) => Ok(TriState::from(*b)),
        RawValue::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(TriState::Unset),
            "true" | "yes" => Ok(TriState::True),
            "false" | "no" => Ok(TriState::False),
            _ => Err(Rejected::new("boolean-like (true/false/yes/no)", raw)),
        },
        _ => Err(Rejected::new("boolean-like (true/false/yes/no)", raw)),
    }
}

/// Normalize a scalar into text; numbers and booleans are stringified
pub fn normalize_text(raw: Option<&RawValue>) -> Result<Option<String>, Rejected> {
    match raw {
        None => Ok(None),
        Some(value) if value.is_blank() => Ok(None),
        Some(value) => value
            .as_scalar()
            .map(Some)
            .ok_or_else(|| Rejected::new("string", value)),
    }
}

/// Normalize text restricted to a fixed set of choices (case-insensitive)
pub fn normalize_choice(
    raw: Option<&RawValue>,
    allowed: &'static [&'static str],
) -> Result<Option<String>, Rejected> {
    let Some(text) = normalize_text(raw)? else {
        return Ok(None);
    };

    let lowered = text.to_ascii_lowercase();
    allowed
        .iter()
        .find(|choice| **choice == lowered)
        .map(|choice| Some((*choice).to_string()))
        .ok_or_else(|| Rejected {
            expected: "one of the allowed choices",
            found: format!("\"{text}\" (allowed: {})", allowed.join(", ")),
        })
}

/// Normalize a mapping of scalars into string pairs
pub fn normalize_mapping(raw: Option<&RawValue>) -> Result<BTreeMap<String, String>, Rejected> {
    match raw {
        None => Ok(BTreeMap::new()),
        Some(RawValue::Map(entries)) => entries
            .iter()
            .map(|(key, value)| {
                value
                    .as_scalar()
                    .map(|v| (key.clone(), v))
                    .ok_or_else(|| Rejected {
                        expected: "mapping of scalar values",
                        found: format!("{} under key '{key}'", value.type_name()),
                    })
            })
            .collect(),
        Some(value) => Err(Rejected::new("mapping", value)),
    }
}
