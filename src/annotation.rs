//! Parsing of field annotations into rule invocations.
//!
//! ```text
//! annotation = segment ("|" segment)*
//! segment    = name (":" paramlist)?
//! paramlist  = part ("," part)*
//! part       = value | key ":" value
//! ```
//!
//! The rule name is everything before the first `:` of a segment. A part
//! with no `:` is positional, a part with exactly one `:` is named, and a
//! part with more than one `:` is malformed. There is no escaping: values
//! can never contain `|`, `,` or `:`.

use indexmap::IndexMap;
use thiserror::Error;

/// Why an annotation could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AnnotationError {
    #[error("segment {index} has an empty rule name")]
    EmptyRuleName { index: usize },

    #[error("rule {rule} has an empty parameter")]
    EmptyParam { rule: String },

    #[error("rule {rule} has a named parameter with an empty key")]
    EmptyParamKey { rule: String },

    #[error("rule {rule} has a malformed parameter {part:?}: more than one ':'")]
    TooManyColons { rule: String, part: String },

    #[error("rule {rule} repeats the named parameter {key}")]
    DuplicateParam { rule: String, key: String },
}

/// Positional and named parameters of one rule invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleParams {
    positional: Vec<String>,
    named: IndexMap<String, String>,
}

impl RuleParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional parameter.
    #[must_use]
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named parameter, replacing any previous value for `key`.
    #[must_use]
    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// The positional parameter at `index`, if present.
    pub fn positional_at(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn named(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    /// Named parameters in source order.
    pub fn named_params(&self) -> &IndexMap<String, String> {
        &self.named
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// One parsed occurrence of a rule in an annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleInvocation {
    pub rule: String,
    pub params: RuleParams,
}

/// Parses a whole annotation into its rule invocations, in source order.
///
/// An empty annotation yields no invocations.
pub fn parse_annotation(annotation: &str) -> Result<Vec<RuleInvocation>, AnnotationError> {
    if annotation.is_empty() {
        return Ok(Vec::new());
    }
    annotation
        .split('|')
        .enumerate()
        .map(|(index, segment)| parse_segment(index, segment))
        .collect()
}

fn parse_segment(index: usize, segment: &str) -> Result<RuleInvocation, AnnotationError> {
    let (name, param_list) = match segment.split_once(':') {
        Some((name, rest)) => (name, Some(rest)),
        None => (segment, None),
    };
    if name.is_empty() {
        return Err(AnnotationError::EmptyRuleName { index });
    }

    let mut params = RuleParams::new();
    if let Some(list) = param_list {
        for part in list.split(',') {
            parse_part(name, part, &mut params)?;
        }
    }

    Ok(RuleInvocation {
        rule: name.to_string(),
        params,
    })
}

fn parse_part(rule: &str, part: &str, params: &mut RuleParams) -> Result<(), AnnotationError> {
    if part.is_empty() {
        return Err(AnnotationError::EmptyParam {
            rule: rule.to_string(),
        });
    }

    let mut pieces = part.splitn(3, ':');
    let head = pieces.next().unwrap_or_default();
    match (pieces.next(), pieces.next()) {
        (None, _) => params.positional.push(head.to_string()),
        (Some(value), None) => {
            if head.is_empty() {
                return Err(AnnotationError::EmptyParamKey {
                    rule: rule.to_string(),
                });
            }
            if params.named.contains_key(head) {
                return Err(AnnotationError::DuplicateParam {
                    rule: rule.to_string(),
                    key: head.to_string(),
                });
            }
            params.named.insert(head.to_string(), value.to_string());
        }
        (Some(_), Some(_)) => {
            return Err(AnnotationError::TooManyColons {
                rule: rule.to_string(),
                part: part.to_string(),
            });
        }
    }
    Ok(())
}
