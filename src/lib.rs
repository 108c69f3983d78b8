//! Declarative, annotation-driven field validation.
//!
//! Fields carry compact rule annotations; a [`Validator`] walks a record,
//! parses each annotation into rule invocations, dispatches them through a
//! shared [`RuleRegistry`](registry::RuleRegistry) and collects failures by
//! dotted field path:
//!
//! ```text
//! record → walk fields → parse annotation → dispatch rules → ErrorSet
//!               ↳ nested record: recurse with "Outer." prefix
//! ```
//!
//! Failures come in two channels. A [`LogicError`] is a programmer error
//! (unknown rule, malformed annotation, unsupported field type) and aborts
//! the call. An [`InputError`] is bad data; many can be collected and they
//! never stop the walk. Check the `Result` first, then the [`ErrorSet`].
//!
//! # Quick Start
//!
//! ```rust
//! fieldcheck::record! {
//!     pub struct Address {
//!         #[tags(validation = "length:op:>,val:4")]
//!         pub street: String,
//!     }
//! }
//!
//! fieldcheck::record! {
//!     pub struct Signup {
//!         #[tags(validation = "email")]
//!         pub email: String,
//!         #[tags(validation = r"regexp:^[a-z]+$,allowEmpty:true")]
//!         pub nickname: String,
//!         pub address: Address,
//!     }
//! }
//!
//! let signup = Signup {
//!     email: "ann@example.org".to_string(),
//!     nickname: String::new(),
//!     address: Address { street: "Elm".to_string() },
//! };
//!
//! let errors = fieldcheck::validate(&signup).expect("annotations are well-formed");
//! assert_eq!(errors.len(), 1);
//! assert_eq!(
//!     errors.get("address.street").unwrap()[0].message,
//!     "The field street should have a length greater than 4. Actual length: 3",
//! );
//! ```
//!
//! # Annotation syntax
//!
//! See [`annotation`] for the grammar. Values cannot contain `|`, `,` or `:`.

pub mod annotation;
pub mod config;
pub mod error;
pub mod json;
pub mod record;
pub mod registry;
pub mod rules;
pub mod validator;

pub use annotation::{RuleInvocation, RuleParams, parse_annotation};
pub use config::ValidatorConfig;
pub use error::*;
pub use record::{Field, FieldValue, Inspect, Record, Tags};
pub use registry::{Rule, RuleError, RuleRegistry};
pub use validator::{FieldPath, Session, Validator, is_composite};

use std::sync::LazyLock;

static DEFAULT_VALIDATOR: LazyLock<Validator> = LazyLock::new(Validator::new);

/// The process-wide validator used by [`validate`] and [`register_rule`].
pub fn default_validator() -> &'static Validator {
    &DEFAULT_VALIDATOR
}

/// Validates `value` with the default validator.
///
/// # Errors
///
/// Returns the [`LogicError`] that aborted the walk, if any.
pub fn validate<T: Inspect + ?Sized>(value: &T) -> Result<ErrorSet, LogicError> {
    DEFAULT_VALIDATOR.validate(value)
}

/// Registers a rule with the default validator.
pub fn register_rule(name: impl Into<String>, rule: impl Rule + 'static) {
    DEFAULT_VALIDATOR.register_rule(name, rule);
}
