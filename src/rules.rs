//! Built-in rules.
//!
//! | Name         | Parameters                                   |
//! |--------------|----------------------------------------------|
//! | `length`     | `op:<op>,val:<n>` or `<op>,<n>`              |
//! | `min_length` | `<n>`                                        |
//! | `max_length` | `<n>`                                        |
//! | `regexp`     | `<pattern>` or `val:<pattern>`, `allowEmpty` |
//! | `email`      | none                                         |
//!
//! Lengths are counted in Unicode scalar values, not bytes.

use crate::annotation::RuleParams;
use crate::error::LogicError;
use crate::record::{FieldValue, Record};
use crate::registry::{Rule, RuleError, RuleRegistry};
use parking_lot::RwLock;
use regex::Regex;
use regex_syntax::hir::{Hir, Look};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$").unwrap()
});

pub(crate) fn register_builtins(registry: &RuleRegistry) {
    registry.register("length", LengthRule);
    registry.register("min_length", MinLengthRule);
    registry.register("max_length", MaxLengthRule);
    registry.register("regexp", RegexpRule::default());
    registry.register("email", EmailRule);
}

// ─── Coercion ───────────────────────────────────────────────────────────────

/// Reads `field` from `record` as text.
///
/// Text and integers are supported, directly or behind one level of
/// indirection. An absent optional value reads as the empty string. Anything
/// else is an unsupported type for `rule`.
pub fn field_text<'a>(
    record: &'a dyn Record,
    rule: &str,
    field: &str,
) -> Result<Cow<'a, str>, LogicError> {
    let value = record
        .field(field)
        .ok_or_else(|| LogicError::FieldNotFound {
            record: record.type_name(),
            field: field.to_string(),
        })?
        .value;
    match value {
        FieldValue::Ref(inner) => scalar_text(inner.inspect(), rule, field),
        other => scalar_text(other, rule, field),
    }
}

fn scalar_text<'a>(
    value: FieldValue<'a>,
    rule: &str,
    field: &str,
) -> Result<Cow<'a, str>, LogicError> {
    match value {
        FieldValue::Text(s) => Ok(Cow::Borrowed(s)),
        FieldValue::Int(n) => Ok(Cow::Owned(n.to_string())),
        FieldValue::Uint(n) => Ok(Cow::Owned(n.to_string())),
        FieldValue::Absent => Ok(Cow::Borrowed("")),
        other => Err(LogicError::UnsupportedType {
            rule: rule.to_string(),
            field: field.to_string(),
            kind: other.kind(),
        }),
    }
}

fn parse_count(rule: &str, param: &str, raw: &str) -> Result<usize, LogicError> {
    raw.parse().map_err(|e: std::num::ParseIntError| LogicError::InvalidParam {
        rule: rule.to_string(),
        param: param.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn missing(rule: &str, param: &str) -> LogicError {
    LogicError::MissingParam {
        rule: rule.to_string(),
        param: param.to_string(),
    }
}

/// Parses a boolean the way configuration files usually spell one.
fn parse_flag(rule: &str, param: &str, raw: &str) -> Result<bool, LogicError> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(LogicError::InvalidParam {
            rule: rule.to_string(),
            param: param.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

// ─── length ─────────────────────────────────────────────────────────────────

/// Comparison operator of the `length` rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl LengthOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(LengthOp::Eq),
            ">" => Some(LengthOp::Gt),
            ">=" => Some(LengthOp::Ge),
            "<" => Some(LengthOp::Lt),
            "<=" => Some(LengthOp::Le),
            _ => None,
        }
    }

    /// Human-readable phrase used in failure messages.
    pub fn phrase(self) -> &'static str {
        match self {
            LengthOp::Eq => "equal to",
            LengthOp::Gt => "greater than",
            LengthOp::Ge => "greater than, or equal to",
            LengthOp::Lt => "lower than",
            LengthOp::Le => "lower than, or equal to",
        }
    }

    pub fn holds(self, actual: usize, bound: usize) -> bool {
        match self {
            LengthOp::Eq => actual == bound,
            LengthOp::Gt => actual > bound,
            LengthOp::Ge => actual >= bound,
            LengthOp::Lt => actual < bound,
            LengthOp::Le => actual <= bound,
        }
    }
}

/// Compares the length of a field against a bound.
pub struct LengthRule;

impl Rule for LengthRule {
    fn validate(
        &self,
        record: &dyn Record,
        field: &str,
        params: &RuleParams,
    ) -> Result<(), RuleError> {
        const RULE: &str = "length";

        let raw_op = params
            .named("op")
            .or_else(|| params.positional_at(0))
            .ok_or_else(|| missing(RULE, "op"))?;
        let op = LengthOp::parse(raw_op).ok_or_else(|| LogicError::InvalidOperator {
            rule: RULE.to_string(),
            op: raw_op.to_string(),
        })?;
        let raw_bound = params
            .named("val")
            .or_else(|| params.positional_at(1))
            .ok_or_else(|| missing(RULE, "val"))?;
        let bound = parse_count(RULE, "val", raw_bound)?;

        let length = field_text(record, RULE, field)?.chars().count();
        if op.holds(length, bound) {
            return Ok(());
        }
        Err(RuleError::Input(format!(
            "The field {} should have a length {} {}. Actual length: {}",
            field,
            op.phrase(),
            bound,
            length
        )))
    }
}

/// `min_length:N`: at least N characters.
pub struct MinLengthRule;

impl Rule for MinLengthRule {
    fn validate(
        &self,
        record: &dyn Record,
        field: &str,
        params: &RuleParams,
    ) -> Result<(), RuleError> {
        const RULE: &str = "min_length";

        let raw = params.positional_at(0).ok_or_else(|| missing(RULE, "0"))?;
        let min = parse_count(RULE, "0", raw)?;
        if field_text(record, RULE, field)?.chars().count() >= min {
            return Ok(());
        }
        Err(RuleError::Input(format!(
            "The field {} should have a minimum length of {} characters",
            field, min
        )))
    }
}

/// `max_length:N`: at most N characters.
pub struct MaxLengthRule;

impl Rule for MaxLengthRule {
    fn validate(
        &self,
        record: &dyn Record,
        field: &str,
        params: &RuleParams,
    ) -> Result<(), RuleError> {
        const RULE: &str = "max_length";

        let raw = params.positional_at(0).ok_or_else(|| missing(RULE, "0"))?;
        let max = parse_count(RULE, "0", raw)?;
        if field_text(record, RULE, field)?.chars().count() <= max {
            return Ok(());
        }
        Err(RuleError::Input(format!(
            "The field {} should have a maximum length of {} characters",
            field, max
        )))
    }
}

// ─── regexp ─────────────────────────────────────────────────────────────────

/// Requires the whole field text to match a regular expression.
///
/// Compiled matchers are cached by pattern text.
#[derive(Debug, Default)]
pub struct RegexpRule {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl RegexpRule {
    fn matcher(&self, field: &str, pattern: &str) -> Result<Regex, LogicError> {
        if let Some(regex) = self.compiled.read().get(pattern) {
            return Ok(regex.clone());
        }
        let regex = whole_match(pattern).map_err(|source| LogicError::InvalidPattern {
            field: field.to_string(),
            source,
        })?;
        self.compiled
            .write()
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

/// Compiles `pattern` into a matcher anchored at both ends of the haystack.
///
/// The anchors wrap the parsed pattern rather than its text, so nothing in
/// the pattern (unbalanced groups, verbose-mode comments) can escape them.
fn whole_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)?;
    let hir = regex_syntax::parse(pattern).map_err(|e| regex::Error::Syntax(e.to_string()))?;
    let anchored = Hir::concat(vec![Hir::look(Look::Start), hir, Hir::look(Look::End)]);
    Regex::new(&anchored.to_string())
}

impl Rule for RegexpRule {
    fn validate(
        &self,
        record: &dyn Record,
        field: &str,
        params: &RuleParams,
    ) -> Result<(), RuleError> {
        const RULE: &str = "regexp";

        let pattern = match (params.named("val"), params.positional()) {
            (Some(pattern), []) => pattern,
            (None, [pattern]) => pattern.as_str(),
            (None, []) => return Err(missing(RULE, "val").into()),
            (_, positional) => {
                return Err(LogicError::InvalidParam {
                    rule: RULE.to_string(),
                    param: "val".to_string(),
                    value: positional.join(","),
                    reason: "expected exactly one pattern".to_string(),
                }
                .into());
            }
        };
        if pattern.is_empty() {
            return Err(LogicError::InvalidParam {
                rule: RULE.to_string(),
                param: "val".to_string(),
                value: String::new(),
                reason: "the pattern is empty".to_string(),
            }
            .into());
        }
        let allow_empty = match params.named("allowEmpty") {
            Some(raw) => parse_flag(RULE, "allowEmpty", raw)?,
            None => false,
        };

        let text = field_text(record, RULE, field)?;
        if allow_empty && text.is_empty() {
            return Ok(());
        }

        if self.matcher(field, pattern)?.is_match(&text) {
            return Ok(());
        }
        Err(RuleError::Input(format!(
            "The field {} does not match regexp",
            field
        )))
    }
}

// ─── email ──────────────────────────────────────────────────────────────────

/// Requires an address of the form `local@domain.tld`.
pub struct EmailRule;

impl Rule for EmailRule {
    fn validate(
        &self,
        record: &dyn Record,
        field: &str,
        params: &RuleParams,
    ) -> Result<(), RuleError> {
        const RULE: &str = "email";

        if !params.is_empty() {
            return Err(LogicError::InvalidParam {
                rule: RULE.to_string(),
                param: "*".to_string(),
                value: String::new(),
                reason: "this rule takes no parameters".to_string(),
            }
            .into());
        }
        if EMAIL_RE.is_match(&field_text(record, RULE, field)?) {
            return Ok(());
        }
        Err(RuleError::Input(format!(
            "The field {} should be a valid email address",
            field
        )))
    }
}
