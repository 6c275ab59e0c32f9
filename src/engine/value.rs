// Copyright © 2024 Pathway

use std::fmt;
use std::sync::Arc;

use arcstr::ArcStr;
use itertools::Itertools as _;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use xxhash_rust::xxh3::Xxh3 as Hasher;

use super::error::{DataError, DynError, DynResult};

/// Record identity: a 128-bit xxh3 digest of the identifying values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(pub u128);

impl Key {
    pub fn for_value(value: &Value) -> Self {
        Self::for_values(std::slice::from_ref(value))
    }

    pub fn for_values(values: &[Value]) -> Self {
        let mut hasher = Hasher::default();
        for value in values {
            value.feed(&mut hasher);
        }
        Self(hasher.digest128())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = base32::encode(base32::Alphabet::Crockford, &self.0.to_le_bytes());
        write!(f, "^{encoded}")
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A single cell of a record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(ArcStr),
    Tuple(Arc<[Self]>),
    /// A cell whose content could not be represented, e.g. an out-of-range
    /// JSON number.
    Error,
}

impl Value {
    #[cold]
    fn mismatch(&self, expected: &'static str) -> DynError {
        DataError::TypeMismatch {
            expected,
            value: self.clone(),
        }
        .into()
    }

    pub fn as_int(&self) -> DynResult<i64> {
        match self {
            Self::Int(i) => Ok(*i),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_string(&self) -> DynResult<&ArcStr> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    /// The type this value belongs to; `None` and `Error` belong to none.
    pub fn type_(&self) -> Option<Type> {
        match self {
            Self::None | Self::Error => None,
            Self::Bool(_) => Some(Type::Bool),
            Self::Int(_) => Some(Type::Int),
            Self::Float(_) => Some(Type::Float),
            Self::String(_) => Some(Type::String),
            Self::Tuple(_) => Some(Type::Tuple),
        }
    }

    fn feed(&self, hasher: &mut Hasher) {
        // Variant tags keep `Int(1)` and `Float(1.0)` apart.
        match self {
            Self::None => hasher.update(&[0]),
            Self::Bool(b) => hasher.update(&[1, u8::from(*b)]),
            Self::Int(i) => {
                hasher.update(&[2]);
                hasher.update(&i.to_le_bytes());
            }
            Self::Float(OrderedFloat(f)) => {
                hasher.update(&[3]);
                // Both zeros hash alike, as do all NaNs.
                #[allow(clippy::float_cmp)]
                let bits = if f.is_nan() {
                    u64::MAX
                } else if *f == 0.0 {
                    0
                } else {
                    f.to_bits()
                };
                hasher.update(&bits.to_le_bytes());
            }
            Self::String(s) => {
                hasher.update(&[4]);
                hasher.update(&(s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            Self::Tuple(values) => {
                hasher.update(&[5]);
                hasher.update(&(values.len() as u64).to_le_bytes());
                for value in values.iter() {
                    value.feed(hasher);
                }
            }
            Self::Error => hasher.update(&[6]),
        }
    }

    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::None,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(f)) => Self::from(f),
                (None, None) => Self::Error,
            },
            JsonValue::String(s) => Self::from(s.as_str()),
            JsonValue::Array(items) => Self::Tuple(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(_) => Self::String(json.to_string().into()),
        }
    }

    pub fn to_json(&self) -> DynResult<JsonValue> {
        Ok(match self {
            Self::None => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(OrderedFloat(f)) => JsonValue::from(*f),
            Self::String(s) => JsonValue::String(s.to_string()),
            Self::Tuple(values) => {
                JsonValue::Array(values.iter().map(Self::to_json).try_collect()?)
            }
            Self::Error => return Err(DataError::ErrorInValue.into()),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(OrderedFloat(x)) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Tuple(values) => write!(f, "({})", values.iter().format(", ")),
            Self::Error => f.write_str("Error"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(OrderedFloat(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<&[Value]> for Value {
    fn from(values: &[Value]) -> Self {
        Self::Tuple(values.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

/// Column type. `Any` accepts every value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    #[default]
    Any,
    Bool,
    Int,
    Float,
    String,
    Tuple,
}

/// A column type together with whether `None` is allowed in it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompoundType {
    pub type_: Type,
    pub is_optional: bool,
}

impl CompoundType {
    pub fn new(type_: Type, is_optional: bool) -> Self {
        Self { type_, is_optional }
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.type_ == Type::Any || value.type_() == Some(self.type_)
    }

    /// Casts `value` to this type. Only lossless or explicitly textual
    /// conversions are performed; anything else is an `IncorrectType` error.
    #[allow(clippy::cast_precision_loss)]
    pub fn convert_value(&self, value: Value) -> DynResult<Value> {
        if self.matches(&value) || self.is_optional && value == Value::None {
            return Ok(value);
        }
        let converted = match (&value, self.type_) {
            (Value::Int(i), Type::Float) => Some(Value::from(*i as f64)),
            #[allow(clippy::cast_possible_truncation)]
            (Value::Float(OrderedFloat(f)), Type::Int) if f.is_finite() && f.fract() == 0.0 => {
                Some(Value::Int(*f as i64))
            }
            (Value::String(s), Type::Int) => s.trim().parse().ok().map(Value::Int),
            (Value::String(s), Type::Float) => s.trim().parse::<f64>().ok().map(Value::from),
            (Value::Bool(_) | Value::Int(_) | Value::Float(_), Type::String) => {
                Some(Value::from(value.to_string()))
            }
            _ => None,
        };
        converted.ok_or_else(|| {
            DataError::IncorrectType {
                value,
                type_: *self,
            }
            .into()
        })
    }
}

impl fmt::Display for CompoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.type_)?;
        if self.is_optional {
            f.write_str(" | None")?;
        }
        Ok(())
    }
}
