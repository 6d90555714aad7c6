//! Typed Bear Options
//!
//! Every bear declares the named options its analysis takes in a
//! [`FunctionMetadata`] record. When a bear is constructed, those options are
//! read from its section once and converted to typed [`OptionValue`]s, so
//! tasks only ever carry a shared, already-parsed [`Options`] map.
//!
//! # Conversions
//!
//! | Kind    | Accepted input                                        |
//! |---------|-------------------------------------------------------|
//! | `Str`   | anything                                              |
//! | `Int`   | a base-10 integer, surrounding whitespace ignored     |
//! | `Float` | anything `f64::from_str` accepts                      |
//! | `Bool`  | `true yes on y 1` / `false no off n 0 none`, any case |
//! | `List`  | comma separated, entries trimmed, empty entries dropped |

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use super::Section;
use crate::error::CoreError;

/// The type an option is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Str,
    Int,
    Float,
    Bool,
    List,
}

impl OptionKind {
    fn describe(self) -> &'static str {
        match self {
            OptionKind::Str => "string",
            OptionKind::Int => "integer",
            OptionKind::Float => "number",
            OptionKind::Bool => "boolean",
            OptionKind::List => "list",
        }
    }

    /// Convert a raw setting string to this kind.
    ///
    /// Returns `None` if the string is not a valid value of this kind.
    pub fn parse(self, raw: &str) -> Option<OptionValue> {
        let trimmed = raw.trim();
        match self {
            OptionKind::Str => Some(OptionValue::Str(raw.to_string())),
            OptionKind::Int => i64::from_str(trimmed).ok().map(OptionValue::Int),
            OptionKind::Float => f64::from_str(trimmed).ok().map(OptionValue::Float),
            OptionKind::Bool => parse_bool(trimmed).map(OptionValue::Bool),
            OptionKind::List => Some(OptionValue::List(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "y" | "1" => Some(true),
        "false" | "no" | "off" | "n" | "0" | "none" => Some(false),
        _ => None,
    }
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(value) => Some(*value),
            OptionValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(value) => f.write_str(value),
            OptionValue::Int(value) => write!(f, "{value}"),
            OptionValue::Float(value) => write!(f, "{value}"),
            OptionValue::Bool(value) => write!(f, "{value}"),
            OptionValue::List(values) => f.write_str(&values.join(", ")),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(values: Vec<String>) -> Self {
        OptionValue::List(values)
    }
}

/// Declaration of one named analysis option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub name: String,
    pub kind: OptionKind,
    /// `None` makes the option mandatory.
    pub default: Option<OptionValue>,
    pub description: String,
}

impl OptionSpec {
    /// A mandatory option.
    pub fn required(
        name: impl Into<String>,
        kind: OptionKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            description: description.into(),
        }
    }

    /// An option that falls back to `default` when the section lacks it.
    pub fn optional(
        name: impl Into<String>,
        kind: OptionKind,
        default: impl Into<OptionValue>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Some(default.into()),
            description: description.into(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// The named options a bear's analysis accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionMetadata {
    pub name: String,
    pub description: String,
    pub params: Vec<OptionSpec>,
}

impl FunctionMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Builder-style parameter registration.
    pub fn param(mut self, spec: OptionSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn non_optional_params(&self) -> impl Iterator<Item = &OptionSpec> {
        self.params.iter().filter(|spec| spec.is_required())
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &OptionSpec> {
        self.params.iter().filter(|spec| !spec.is_required())
    }
}

/// Options resolved for one bear instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: IndexMap<String, OptionValue>,
}

impl Options {
    /// Read every declared option from `section`.
    ///
    /// `bear` only names the owner in error messages.
    pub fn resolve(
        bear: &str,
        section: &Section,
        metadata: &FunctionMetadata,
    ) -> Result<Self, CoreError> {
        let mut values = IndexMap::with_capacity(metadata.params.len());

        for spec in &metadata.params {
            let value = match (section.get(&spec.name), &spec.default) {
                (Some(raw), _) => spec.kind.parse(raw).ok_or_else(|| CoreError::InvalidSetting {
                    section: section.name().to_string(),
                    setting: spec.name.clone(),
                    value: raw.to_string(),
                    expected: spec.kind.describe(),
                })?,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(CoreError::MissingSetting {
                        bear: bear.to_string(),
                        section: section.name().to_string(),
                        setting: spec.name.clone(),
                    })
                }
            };
            values.insert(spec.name.to_lowercase(), value);
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(&name.to_lowercase())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(OptionValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(OptionValue::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(OptionValue::as_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> FunctionMetadata {
        FunctionMetadata::new("analyze", "Checks line lengths.")
            .param(OptionSpec::required("max_line_length", OptionKind::Int, "Maximum line length."))
            .param(OptionSpec::optional(
                "use_spaces",
                OptionKind::Bool,
                true,
                "Indent with spaces.",
            ))
            .param(OptionSpec::optional(
                "ignore",
                OptionKind::List,
                Vec::<String>::new(),
                "Patterns to skip.",
            ))
    }

    #[test]
    fn resolves_typed_values_and_defaults() {
        let section = Section::new("python")
            .with("MAX_LINE_LENGTH", " 79 ")
            .with("ignore", "*.pyc, , build/ ");

        let options = Options::resolve("LineLengthBear", &section, &metadata()).unwrap();

        assert_eq!(options.get_int("max_line_length"), Some(79));
        assert_eq!(options.get_bool("use_spaces"), Some(true));
        assert_eq!(
            options.get_list("ignore"),
            Some(&["*.pyc".to_string(), "build/".to_string()][..])
        );
        assert_eq!(options.len(), 3);
    }

    #[test]
    fn missing_required_option_names_bear_and_section() {
        let error =
            Options::resolve("LineLengthBear", &Section::new("python"), &metadata()).unwrap_err();

        match error {
            CoreError::MissingSetting { bear, section, setting } => {
                assert_eq!(bear, "LineLengthBear");
                assert_eq!(section, "python");
                assert_eq!(setting, "max_line_length");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unconvertible_value_is_rejected() {
        let section = Section::new("python")
            .with("max_line_length", "80")
            .with("use_spaces", "sometimes");

        let error = Options::resolve("LineLengthBear", &section, &metadata()).unwrap_err();

        assert!(matches!(
            error,
            CoreError::InvalidSetting { expected: "boolean", .. }
        ));
    }

    #[test]
    fn bool_spellings() {
        for raw in ["yes", "TRUE", "On", "1", "y"] {
            assert_eq!(OptionKind::Bool.parse(raw), Some(OptionValue::Bool(true)), "{raw}");
        }
        for raw in ["no", "False", "OFF", "0", "n", "None"] {
            assert_eq!(OptionKind::Bool.parse(raw), Some(OptionValue::Bool(false)), "{raw}");
        }
        assert_eq!(OptionKind::Bool.parse("maybe"), None);
    }

    #[test]
    fn metadata_splits_required_and_optional() {
        let metadata = metadata();
        let required: Vec<_> = metadata.non_optional_params().map(|p| p.name.as_str()).collect();
        let optional: Vec<_> = metadata.optional_params().map(|p| p.name.as_str()).collect();

        assert_eq!(required, ["max_line_length"]);
        assert_eq!(optional, ["use_spaces", "ignore"]);
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(OptionValue::Int(3).as_float(), Some(3.0));
        assert_eq!(OptionKind::Float.parse("2.5").and_then(|v| v.as_float()), Some(2.5));
        assert_eq!(OptionKind::Int.parse("2.5"), None);
    }
}
