use std::fmt;

use compact_str::CompactString;

/// Values carried by tokens and produced by reductions.
///
/// Helper productions (`X?`, `X*`, `X+` and the named list definitions)
/// build their values through [`from_items`](Self::from_items) and take them
/// apart through [`into_items`](Self::into_items); absent optionals yield
/// [`Default::default`].
pub trait SemanticValue: Clone + Default + fmt::Debug + Send + Sync + 'static {
    /// Build a list value
    fn from_items(items: Vec<Self>) -> Self;

    /// Take a list value apart. Non-list values become a single item.
    fn into_items(self) -> Vec<Self>;
}

/// A ready-made dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(CompactString),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

impl SemanticValue for Value {
    fn from_items(items: Vec<Self>) -> Self {
        Self::List(items)
    }

    fn into_items(self) -> Vec<Self> {
        match self {
            Self::List(items) => items,
            Self::Nil => Vec::new(),
            other => vec![other],
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}
