use crate::annotation::AnnotationError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A fatal configuration or programmer error.
///
/// At most one is produced per validation call. It aborts the walk and is
/// returned instead of the collected input errors.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum LogicError {
    #[error("Rule not found: {rule}")]
    RuleNotFound { rule: String },

    #[error("composite type expected, got {kind}")]
    CompositeExpected { kind: &'static str },

    #[error("only one level of indirection is supported in front of a composite value")]
    IndirectionTooDeep,

    #[error("malformed annotation {annotation:?} on field {field}: {source}")]
    MalformedAnnotation {
        field: String,
        annotation: String,
        #[source]
        source: AnnotationError,
    },

    #[error("record {record} has no field {field}")]
    FieldNotFound { record: &'static str, field: String },

    #[error("rule {rule} requires the parameter {param}")]
    MissingParam { rule: String, param: String },

    #[error("invalid value {value:?} for parameter {param} of rule {rule}: {reason}")]
    InvalidParam {
        rule: String,
        param: String,
        value: String,
        reason: String,
    },

    #[error("Invalid operator {op:?} for rule {rule}")]
    InvalidOperator { rule: String, op: String },

    #[error("The field {field} does not contain a valid regexp")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unsupported type for rule {rule}: field {field} is {kind}")]
    UnsupportedType {
        rule: String,
        field: String,
        kind: &'static str,
    },

    #[error("rule {rule} panicked while checking {field}: {message}")]
    RulePanicked {
        rule: String,
        field: String,
        message: String,
    },

    #[error("records nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },
}

/// A recoverable failure of the input data for one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputError {
    /// Dotted path from the validation root to the field.
    pub path: String,
    /// Name of the rule that rejected the value.
    pub rule: String,
    pub message: String,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for InputError {}

/// Input errors grouped by field path, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorSet {
    by_field: IndexMap<String, Vec<InputError>>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, error: InputError) {
        self.by_field
            .entry(error.path.clone())
            .or_default()
            .push(error);
    }

    /// Errors recorded for the field at `path`.
    pub fn get(&self, path: &str) -> Option<&[InputError]> {
        self.by_field.get(path).map(Vec::as_slice)
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    /// Total number of errors across all fields.
    pub fn error_count(&self) -> usize {
        self.by_field.values().map(Vec::len).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_field.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[InputError])> {
        self.by_field
            .iter()
            .map(|(path, errors)| (path.as_str(), errors.as_slice()))
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (path, errors) in self.iter() {
            write!(f, "{}: ", path)?;
            for (i, error) in errors.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", error)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Failure to load or apply validator configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid YAML: {message}")]
    Yaml { message: String },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str, message: &str) -> InputError {
        InputError {
            path: path.to_string(),
            rule: "test".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn groups_by_path_in_discovery_order() {
        let mut set = ErrorSet::new();
        set.push(input("b", "first"));
        set.push(input("a", "second"));
        set.push(input("b", "third"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.error_count(), 3);
        assert_eq!(set.paths().collect::<Vec<_>>(), ["b", "a"]);
        let b: Vec<_> = set.get("b").unwrap().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(b, ["first", "third"]);
        assert!(set.get("c").is_none());
    }

    #[test]
    fn display_lists_each_field_on_its_own_line() {
        let mut set = ErrorSet::new();
        set.push(input("name", "too short"));
        set.push(input("name", "no match"));
        set.push(input("city", "empty"));
        assert_eq!(set.to_string(), "name: too short, no match\ncity: empty\n");
    }

    #[test]
    fn serializes_as_a_path_keyed_object() {
        let mut set = ErrorSet::new();
        set.push(input("name", "too short"));
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["name"][0]["message"], "too short");
        assert_eq!(json["name"][0]["rule"], "test");
    }

    #[test]
    fn invalid_operator_mentions_the_phrase() {
        let err = LogicError::InvalidOperator {
            rule: "length".to_string(),
            op: "ar".to_string(),
        };
        assert!(err.to_string().contains("Invalid operator"));
    }
}
