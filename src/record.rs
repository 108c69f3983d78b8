//! Introspection over records.
//!
//! The engine never looks at concrete Rust types. A value exposes itself
//! through [`Inspect`], and composite values additionally implement
//! [`Record`], which enumerates fields in declaration order together with
//! their visibility, their annotation tags and a view of their value.
//!
//! Most types get these impls from the [`record!`](crate::record!) macro:
//!
//! ```rust
//! fieldcheck::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Account {
//!         #[tags(validation = "length:op:>=,val:4")]
//!         pub name: String,
//!         token: String,
//!     }
//! }
//!
//! let errors = fieldcheck::validate(&Account::default()).expect("well-formed annotations");
//! assert_eq!(errors.len(), 1);
//! ```

use indexmap::IndexMap;
use std::fmt;

/// How the engine sees one value.
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// An empty optional value.
    Absent,
    /// A composite value whose fields can be walked.
    Record(&'a dyn Record),
    /// One level of indirection (`&`, `Box`, `Some`) in front of another value.
    Ref(&'a dyn Inspect),
    /// Anything else, identified by a short kind name.
    Opaque(&'static str),
}

impl<'a> FieldValue<'a> {
    /// Short, stable name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Int(_) => "signed integer",
            FieldValue::Uint(_) => "unsigned integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
            FieldValue::Absent => "absent",
            FieldValue::Record(_) => "record",
            FieldValue::Ref(_) => "reference",
            FieldValue::Opaque(kind) => kind,
        }
    }

    /// Returns the record behind this value, looking through at most one
    /// level of indirection.
    pub fn as_record(self) -> Option<&'a dyn Record> {
        match self {
            FieldValue::Record(record) => Some(record),
            FieldValue::Ref(inner) => match inner.inspect() {
                FieldValue::Record(record) => Some(record),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.debug_tuple("Text").field(s).finish(),
            FieldValue::Int(n) => f.debug_tuple("Int").field(n).finish(),
            FieldValue::Uint(n) => f.debug_tuple("Uint").field(n).finish(),
            FieldValue::Float(n) => f.debug_tuple("Float").field(n).finish(),
            FieldValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldValue::Absent => f.write_str("Absent"),
            FieldValue::Record(r) => f.debug_tuple("Record").field(&r.type_name()).finish(),
            FieldValue::Ref(inner) => f.debug_tuple("Ref").field(&inner.inspect()).finish(),
            FieldValue::Opaque(kind) => f.debug_tuple("Opaque").field(kind).finish(),
        }
    }
}

/// Annotation tags attached to one field, keyed by tag name.
#[derive(Clone, Copy, Debug)]
pub enum Tags<'a> {
    None,
    Static(&'static [(&'static str, &'static str)]),
    Map(&'a IndexMap<String, String>),
}

impl<'a> Tags<'a> {
    /// Returns the annotation stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        match self {
            Tags::None => None,
            Tags::Static(pairs) => pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v),
            Tags::Map(map) => map.get(key).map(String::as_str),
        }
    }
}

/// One field of a record.
#[derive(Clone, Copy, Debug)]
pub struct Field<'a> {
    pub name: &'a str,
    /// Whether the field belongs to the public contract of the record.
    /// Non-public fields are never validated.
    pub public: bool,
    pub tags: Tags<'a>,
    pub value: FieldValue<'a>,
}

/// Exposes a value to the validation engine.
pub trait Inspect {
    fn inspect(&self) -> FieldValue<'_>;
}

/// A composite value with named fields.
pub trait Record {
    /// Name of the record type, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// All fields, public or not, in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;

    /// Looks up a single field by name.
    fn field(&self, name: &str) -> Option<Field<'_>> {
        self.fields().into_iter().find(|f| f.name == name)
    }
}

impl Inspect for str {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl Inspect for String {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Text(self.as_str())
    }
}

impl Inspect for bool {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

macro_rules! inspect_as {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(
            impl Inspect for $t {
                fn inspect(&self) -> FieldValue<'_> {
                    FieldValue::$variant(*self as $target)
                }
            }
        )*
    };
}

inspect_as!(Int, i64: i8, i16, i32, i64, isize);
inspect_as!(Uint, u64: u8, u16, u32, u64, usize);
inspect_as!(Float, f64: f32, f64);

impl Inspect for char {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Opaque("char")
    }
}

impl<T: Inspect> Inspect for Box<T> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Ref(&**self)
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self) -> FieldValue<'_> {
        match self {
            Some(inner) => FieldValue::Ref(inner),
            None => FieldValue::Absent,
        }
    }
}

impl<T: Inspect> Inspect for &T {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Ref(*self)
    }
}

impl Inspect for &str {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl<T> Inspect for Vec<T> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Opaque("sequence")
    }
}

/// Declares a struct and implements [`Inspect`] and [`Record`] for it.
///
/// Field annotations are written as `#[tags(key = "annotation", ...)]`
/// in front of the field. Only fields declared `pub` are part of the
/// public contract; everything else is skipped by the walker. Lifetime
/// parameters are accepted, so fields may borrow other records.
///
/// ```rust
/// fieldcheck::record! {
///     pub struct Address {
///         #[tags(validation = "min_length:2")]
///         pub city: String,
///     }
/// }
///
/// fieldcheck::record! {
///     pub struct Customer {
///         #[tags(validation = "email", form = "email")]
///         pub email: String,
///         pub address: Address,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(<$($lt:lifetime),+ $(,)?>)? {
            $(
                $(#[tags($($tag:ident = $annotation:literal),* $(,)?)])?
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name $(<$($lt),+>)? {
            $( $fvis $field: $ty, )*
        }

        impl $(<$($lt),+>)? $crate::record::Inspect for $name $(<$($lt),+>)? {
            fn inspect(&self) -> $crate::record::FieldValue<'_> {
                $crate::record::FieldValue::Record(self)
            }
        }

        impl $(<$($lt),+>)? $crate::record::Record for $name $(<$($lt),+>)? {
            fn type_name(&self) -> &'static str {
                stringify!($name)
            }

            fn fields(&self) -> ::std::vec::Vec<$crate::record::Field<'_>> {
                ::std::vec![
                    $(
                        $crate::record::Field {
                            name: stringify!($field),
                            public: stringify!($fvis) == "pub",
                            tags: $crate::record::Tags::Static(&[
                                $($( (stringify!($tag), $annotation) ),*)?
                            ]),
                            value: $crate::record::Inspect::inspect(&self.$field),
                        },
                    )*
                ]
            }
        }
    };
}
