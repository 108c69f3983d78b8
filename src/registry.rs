//! Name to rule bindings.
//!
//! A [`RuleRegistry`] is written during setup and read on every dispatch. It
//! is guarded by a reader/writer lock so validators on many threads can share
//! one registry while custom rules are still registered late.

use crate::annotation::RuleParams;
use crate::error::LogicError;
use crate::record::Record;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Why a rule rejected a field.
#[derive(Clone, Debug)]
pub enum RuleError {
    /// The value is present but fails the check. Validation continues.
    Input(String),
    /// The rule is misconfigured or cannot handle the field. Validation stops.
    Logic(LogicError),
}

impl From<LogicError> for RuleError {
    fn from(err: LogicError) -> Self {
        RuleError::Logic(err)
    }
}

/// A named, stateless check applied to one field of a record.
///
/// Everything a check needs arrives as arguments so that one instance can be
/// shared by every validator holding the registry.
pub trait Rule: Send + Sync {
    fn validate(&self, record: &dyn Record, field: &str, params: &RuleParams)
    -> Result<(), RuleError>;
}

/// A [`Rule`] backed by a closure. Build one with [`rule_fn`].
pub struct FnRule<F>(F);

impl<F> Rule for FnRule<F>
where
    F: Fn(&dyn Record, &str, &RuleParams) -> Result<(), RuleError> + Send + Sync,
{
    fn validate(
        &self,
        record: &dyn Record,
        field: &str,
        params: &RuleParams,
    ) -> Result<(), RuleError> {
        (self.0)(record, field, params)
    }
}

/// Wraps a closure as a [`Rule`].
///
/// ```rust
/// use fieldcheck::registry::{RuleError, rule_fn};
///
/// let validator = fieldcheck::Validator::new();
/// validator.register_rule(
///     "never",
///     rule_fn(|_, field, _| Err(RuleError::Input(format!("{} is never valid", field)))),
/// );
/// ```
pub fn rule_fn<F>(f: F) -> FnRule<F>
where
    F: Fn(&dyn Record, &str, &RuleParams) -> Result<(), RuleError> + Send + Sync,
{
    FnRule(f)
}

#[derive(Default)]
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, Arc<dyn Rule>>>,
}

impl RuleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in rules.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::rules::register_builtins(&registry);
        registry
    }

    /// Binds `rule` to `name`, replacing any previous binding.
    pub fn register(&self, name: impl Into<String>, rule: impl Rule + 'static) {
        self.register_arc(name, Arc::new(rule));
    }

    pub fn register_arc(&self, name: impl Into<String>, rule: Arc<dyn Rule>) {
        let name = name.into();
        tracing::debug!(rule = %name, "registering rule");
        self.rules.write().insert(name, rule);
    }

    /// Looks up the rule bound to `name`.
    ///
    /// The returned handle keeps the rule alive after the lock is released,
    /// so rule code never runs while the registry is locked.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Rule>, LogicError> {
        self.rules
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LogicError::RuleNotFound {
                rule: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.read().contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
