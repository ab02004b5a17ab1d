use crate::model::enums::SettingType;
use std::fmt::{Display, Formatter};

/// Represents the value of a feature flag or setting.
///
/// # Examples
///
/// ```rust
/// use configcat_core::Value;
///
/// let bool_val = Value::Bool(true);
/// let int_val = Value::from(42);
/// assert_eq!(int_val.as_int(), Some(42));
/// ```
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    /// A bool feature flag's value.
    Bool(bool),
    /// A whole number setting's value.
    Int(i64),
    /// A decimal number setting's value.
    Float(f64),
    /// A text setting's value.
    String(String),
}

impl Value {
    /// Reads the value as `bool`. Returns [`None`] if it's not a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(val) => Some(*val),
            _ => None,
        }
    }

    /// Reads the value as `i64`. Returns [`None`] if it's not a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(val) => Some(*val),
            _ => None,
        }
    }

    /// Reads the value as `f64`. Returns [`None`] if it's not a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(val) => Some(*val),
            _ => None,
        }
    }

    /// Reads the value as [`String`]. Returns [`None`] if it's not a [`Value::String`].
    pub fn as_str(&self) -> Option<String> {
        match self {
            Value::String(val) => Some(val.clone()),
            _ => None,
        }
    }

    /// The [`SettingType`] a setting must have to be able to produce this value.
    pub fn setting_type(&self) -> SettingType {
        match self {
            Value::Bool(_) => SettingType::Bool,
            Value::Int(_) => SettingType::Int,
            Value::Float(_) => SettingType::Float,
            Value::String(_) => SettingType::String,
        }
    }

    /// Creates a [`Value`] from a [`serde_json::Value`]. Returns [`None`] for nulls, arrays and objects.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use configcat_core::Value;
    ///
    /// let json_str = serde_json::Value::String("foo".to_owned());
    /// assert_eq!(Value::String("foo".to_owned()), Value::from_json_val(&json_str).unwrap())
    /// ```
    pub fn from_json_val(json_val: &serde_json::Value) -> Option<Value> {
        match json_val {
            serde_json::Value::Bool(val) => Some(Value::Bool(*val)),
            serde_json::Value::String(val) => Some(Value::String(val.clone())),
            serde_json::Value::Number(val) => val
                .as_i64()
                .map(Value::Int)
                .or_else(|| val.as_f64().map(Value::Float)),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(val) => write!(f, "{val}"),
            Value::Int(val) => write!(f, "{val}"),
            Value::Float(val) => write!(f, "{val}"),
            Value::String(val) => f.write_str(val),
        }
    }
}

pub(crate) trait OptionalValueDisplay {
    fn to_str(&self) -> String;
}

impl OptionalValueDisplay for Option<&Value> {
    fn to_str(&self) -> String {
        match self {
            None => "none".to_owned(),
            Some(value) => format!("{value}"),
        }
    }
}

/// Represents a primitive type that can describe the value of a feature flag or setting.
pub trait ValuePrimitive: Into<Value> {
    /// Reads the primitive value from a [`Value`].
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! primitive_impl {
    ($variant:ident $as_m:ident $t:ty) => {
        impl_from_for_variant!(Value, $variant, [$t]);

        impl ValuePrimitive for $t {
            fn from_value(value: &Value) -> Option<Self> {
                value.$as_m()
            }
        }
    };
}

primitive_impl!(String as_str String);
primitive_impl!(Float as_float f64);
primitive_impl!(Int as_int i64);
primitive_impl!(Bool as_bool bool);
impl_from_for_variant!(Value, String, into [&str]);
impl_from_for_variant!(Value, Int, into [i32]);
