//! Typed values
//!
//! `Scalar` and `Data` are the values callers hand to the client and get
//! back from it. The store itself only holds strings and lists of strings;
//! `Scalar::to_wire` is the one place a typed element becomes text.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A single typed element
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    /// Text stored on the wire for this element
    pub fn to_wire(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            Scalar::Int(i) => i.to_string(),
            // Debug keeps a trailing `.0` so the text reads back as a float
            Scalar::Float(f) => format!("{:?}", f),
            Scalar::Bool(true) => "True".to_string(),
            Scalar::Bool(false) => "False".to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

// Floats compare by bit pattern so `Scalar` can live in a `HashSet`.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Str(s) => s.hash(state),
            Scalar::Int(i) => i.hash(state),
            Scalar::Float(f) => f.to_bits().hash(state),
            Scalar::Bool(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// A value as stored under one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Data {
    /// Scalar storage (one string on the wire)
    Scalar(Scalar),

    /// Ordered collection storage
    List(Vec<Scalar>),

    /// Unordered collection; stored as a list, order not preserved
    Set(HashSet<Scalar>),
}

impl Data {
    /// Build a scalar string value (the shape every store reply decodes to)
    pub fn string(s: impl Into<String>) -> Self {
        Data::Scalar(Scalar::Str(s.into()))
    }

    /// Build a list of strings
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Data::List(items.into_iter().map(|s| Scalar::Str(s.into())).collect())
    }

    pub fn is_collection(&self) -> bool {
        !matches!(self, Data::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Data::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_scalar().and_then(Scalar::as_int)
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_float)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Scalar::as_bool)
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&HashSet<Scalar>> {
        match self {
            Data::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Wire text of every element, in storage order
    pub fn to_wire_elements(&self) -> Vec<String> {
        match self {
            Data::Scalar(s) => vec![s.to_wire()],
            Data::List(items) => items.iter().map(Scalar::to_wire).collect(),
            Data::Set(items) => items.iter().map(Scalar::to_wire).collect(),
        }
    }
}

// =============================================================================
// Conversions into typed values
// =============================================================================

macro_rules! scalar_from {
    ($variant:ident, $target:ty => $($t:ty),+) => {
        $(
            impl From<$t> for Scalar {
                fn from(v: $t) -> Self {
                    Scalar::$variant(v as $target)
                }
            }

            impl From<$t> for Data {
                fn from(v: $t) -> Self {
                    Data::Scalar(Scalar::from(v))
                }
            }
        )+
    };
}

scalar_from!(Int, i64 => i8, i16, i32, i64, u8, u16, u32);
scalar_from!(Float, f64 => f64);

// Widening with `as` would store 0.1f32 as 0.10000000149011612; go through
// the shortest text that reads back as the same f32 instead.
impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(format!("{:?}", v).parse().unwrap_or(v as f64))
    }
}

impl From<f32> for Data {
    fn from(v: f32) -> Self {
        Data::Scalar(Scalar::from(v))
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<bool> for Data {
    fn from(v: bool) -> Self {
        Data::Scalar(Scalar::Bool(v))
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl From<String> for Data {
    fn from(v: String) -> Self {
        Data::Scalar(Scalar::Str(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<&str> for Data {
    fn from(v: &str) -> Self {
        Data::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<Scalar> for Data {
    fn from(v: Scalar) -> Self {
        Data::Scalar(v)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for Data {
    fn from(v: Vec<T>) -> Self {
        Data::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar> + Clone> From<&[T]> for Data {
    fn from(v: &[T]) -> Self {
        Data::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for Data {
    fn from(v: [T; N]) -> Self {
        Data::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>> From<HashSet<T>> for Data {
    fn from(v: HashSet<T>) -> Self {
        Data::Set(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>> From<BTreeSet<T>> for Data {
    fn from(v: BTreeSet<T>) -> Self {
        Data::Set(v.into_iter().map(Into::into).collect())
    }
}
