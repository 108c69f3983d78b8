//! The field walker and guarded rule dispatch.
//!
//! A [`Validator`] is immutable configuration: a shared rule registry, the
//! tag key annotations are read from and a nesting limit. Each validation
//! runs in its own [`Session`], which owns the collected errors, the current
//! field path and the logic-error slot, so one validator can serve many
//! concurrent callers.

use crate::annotation::{RuleInvocation, parse_annotation};
use crate::config::ValidatorConfig;
use crate::error::{ConfigError, ErrorSet, InputError, LogicError};
use crate::record::{FieldValue, Inspect, Record};
use crate::registry::{Rule, RuleError, RuleRegistry};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Tag key read when none is configured.
pub const DEFAULT_TAG_KEY: &str = "validation";

/// Deepest record nesting walked when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Names from the validation root to the current record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Dotted path of `field` inside the current record.
    pub fn join(&self, field: &str) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push_str(segment);
            path.push('.');
        }
        path.push_str(field);
        path
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Validation configuration.
///
/// Cloning (or [`derive`](Validator::derive)) shares the rule registry: a
/// rule registered through either validator is visible to both. The tag key
/// and depth limit are per validator.
#[derive(Clone, Debug)]
pub struct Validator {
    registry: Arc<RuleRegistry>,
    tag_key: String,
    max_depth: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator with the built-in rules and default settings.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(RuleRegistry::with_builtins()))
    }

    /// A validator reading rules from an existing registry.
    pub fn with_registry(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            tag_key: DEFAULT_TAG_KEY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A validator with the built-in rules and the given settings.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        config.check()?;
        let mut validator = Self::new();
        validator.tag_key = config.tag_key.clone();
        validator.max_depth = config.max_depth;
        Ok(validator)
    }

    /// A new validator sharing this one's registry and settings.
    pub fn derive(&self) -> Self {
        self.clone()
    }

    /// Binds `rule` to `name` in the shared registry.
    pub fn register_rule(&self, name: impl Into<String>, rule: impl Rule + 'static) {
        self.registry.register(name, rule);
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        &self.registry
    }

    /// Sets the tag key annotations are read from.
    pub fn set_tag_key(&mut self, key: impl Into<String>) -> Result<(), ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "tag_key",
                reason: "must not be empty".to_string(),
            });
        }
        self.tag_key = key;
        Ok(())
    }

    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Starts an empty validation session.
    pub fn session(&self) -> Session<'_> {
        Session {
            validator: self,
            errors: ErrorSet::new(),
            path: FieldPath::new(),
            logic_error: None,
        }
    }

    /// Validates `value` in a fresh session.
    ///
    /// # Errors
    ///
    /// Returns the logic error that aborted the walk. Input errors are not
    /// errors of this call: they are in the returned [`ErrorSet`], which is
    /// empty when the value passed every rule.
    pub fn validate<T: Inspect + ?Sized>(&self, value: &T) -> Result<ErrorSet, LogicError> {
        let mut session = self.session();
        session.validate(value)?;
        Ok(session.into_errors())
    }
}

/// State of one validation run.
pub struct Session<'v> {
    validator: &'v Validator,
    errors: ErrorSet,
    path: FieldPath,
    logic_error: Option<LogicError>,
}

impl<'v> Session<'v> {
    /// Walks `value`, collecting input errors into this session.
    ///
    /// Once a logic error has occurred the session is spent: it is stored and
    /// returned again by every later call.
    pub fn validate<T: Inspect + ?Sized>(&mut self, value: &T) -> Result<(), LogicError> {
        if let Some(err) = &self.logic_error {
            return Err(err.clone());
        }
        let result = match value.inspect() {
            FieldValue::Record(record) => self.walk(record),
            FieldValue::Ref(inner) => match inner.inspect() {
                FieldValue::Record(record) => self.walk(record),
                FieldValue::Ref(_) => Err(LogicError::IndirectionTooDeep),
                other => Err(LogicError::CompositeExpected { kind: other.kind() }),
            },
            other => Err(LogicError::CompositeExpected { kind: other.kind() }),
        };
        if let Err(err) = &result {
            debug!(error = %err, "validation aborted");
            self.path = FieldPath::new();
            self.logic_error = Some(err.clone());
        }
        result
    }

    /// Collected input errors, or `None` when there are none.
    pub fn errors(&self) -> Option<&ErrorSet> {
        if self.errors.is_empty() {
            None
        } else {
            Some(&self.errors)
        }
    }

    /// Input errors for the field at the dotted `path`.
    pub fn errors_for_field(&self, path: &str) -> Option<&[InputError]> {
        self.errors.get(path)
    }

    pub fn logic_error(&self) -> Option<&LogicError> {
        self.logic_error.as_ref()
    }

    pub fn into_errors(self) -> ErrorSet {
        self.errors
    }

    fn walk(&mut self, record: &dyn Record) -> Result<(), LogicError> {
        for field in record.fields() {
            if !field.public {
                continue;
            }

            // Nested records are walked; an annotation on the field holding
            // them is not evaluated.
            if let Some(nested) = field.value.as_record() {
                if self.path.depth() >= self.validator.max_depth {
                    return Err(LogicError::DepthExceeded {
                        limit: self.validator.max_depth,
                    });
                }
                trace!(record = nested.type_name(), path = %self.path.join(field.name), "entering nested record");
                self.path.push(field.name);
                let result = self.walk(nested);
                self.path.pop();
                result?;
                continue;
            }

            let Some(annotation) = field.tags.get(&self.validator.tag_key) else {
                continue;
            };
            if annotation.is_empty() {
                continue;
            }
            let invocations =
                parse_annotation(annotation).map_err(|source| LogicError::MalformedAnnotation {
                    field: self.path.join(field.name),
                    annotation: annotation.to_string(),
                    source,
                })?;
            for invocation in &invocations {
                self.dispatch(record, field.name, invocation)?;
            }
        }
        Ok(())
    }

    /// Runs one rule, turning a panic inside rule code into a logic error.
    fn dispatch(
        &mut self,
        record: &dyn Record,
        field: &str,
        invocation: &RuleInvocation,
    ) -> Result<(), LogicError> {
        let path = self.path.join(field);
        debug!(rule = %invocation.rule, path = %path, "applying rule");

        let rule = self.validator.registry.lookup(&invocation.rule)?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            rule.validate(record, field, &invocation.params)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(rule = %invocation.rule, path = %path, panic = %message, "rule panicked");
            Err(RuleError::Logic(LogicError::RulePanicked {
                rule: invocation.rule.clone(),
                field: path.clone(),
                message,
            }))
        });

        match outcome {
            Ok(()) => Ok(()),
            Err(RuleError::Input(message)) => {
                self.errors.push(InputError {
                    path,
                    rule: invocation.rule.clone(),
                    message,
                });
                Ok(())
            }
            Err(RuleError::Logic(err)) => Err(err),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Returns true if `value` is a record, or a single indirection to one.
pub fn is_composite<T: Inspect + ?Sized>(value: &T) -> bool {
    value.inspect().as_record().is_some()
}
