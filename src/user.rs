use chrono::{DateTime, Utc};
use semver::Version;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Name of the attribute holding the user's unique identifier.
pub const IDENTIFIER: &str = "Identifier";
/// Name of the attribute holding the user's email address.
pub const EMAIL: &str = "Email";
/// Name of the attribute holding the user's country.
pub const COUNTRY: &str = "Country";

/// A User Object attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum UserValue {
    /// Text value.
    String(String),
    /// Signed whole number.
    Int(i64),
    /// Unsigned whole number.
    UInt(u64),
    /// Decimal number.
    Float(f64),
    /// Point in time, compared as Unix seconds by `BEFORE` / `AFTER`.
    DateTime(DateTime<Utc>),
    /// List of strings, used by the `ARRAY CONTAINS` comparators.
    StringVec(Vec<String>),
    /// Semantic version.
    SemVer(Version),
}

impl Display for UserValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UserValue::String(val) => f.write_str(val),
            UserValue::Int(val) => write!(f, "{val}"),
            UserValue::UInt(val) => write!(f, "{val}"),
            UserValue::Float(val) => f.write_str(&float_to_text(*val)),
            UserValue::DateTime(val) => write!(f, "{}", val.to_rfc3339()),
            UserValue::StringVec(val) => write!(f, "{}", serde_json::json!(val)),
            UserValue::SemVer(val) => write!(f, "{val}"),
        }
    }
}

impl Serialize for UserValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            UserValue::Int(val) => serializer.serialize_i64(*val),
            UserValue::UInt(val) => serializer.serialize_u64(*val),
            UserValue::Float(val) => serializer.serialize_f64(*val),
            UserValue::StringVec(val) => {
                let mut seq = serializer.serialize_seq(Some(val.len()))?;
                for element in val {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Describes a User Object. Contains user attributes which are used for evaluating targeting rules and percentage options.
///
/// Comparators interpret attribute values as follows:
///
/// **Text-based comparators** (`EQUALS`, `IS ONE OF`, etc.)
/// * accept [`String`] values,
/// * other values are converted to text (a warning is logged and the evaluation continues).
///
/// **SemVer-based comparators** accept [`Version`] values or [`String`] values holding a valid semantic version.
///
/// **Number-based comparators** accept `Int`, `UInt`, `Float` values or [`String`] values holding a number.
///
/// **Date time-based comparators** (`BEFORE` / `AFTER`) accept [`DateTime`] values, or
/// numbers (and numeric strings) representing Unix timestamps in seconds.
///
/// **String array-based comparators** accept [`Vec`] of [`String`]s or a [`String`] holding a JSON array of strings.
///
/// Any other combination makes the condition unevaluable: a warning is logged and the targeting rule is skipped.
///
/// # Examples:
///
/// ```rust
/// use configcat_core::User;
///
/// use std::str::FromStr;
/// use chrono::{DateTime, Utc};
///
/// let user = User::new("user-id")
///     .email("john@example.com")
///     .custom("Rating", 4.5)
///     .custom("RegisteredAt", DateTime::<Utc>::from_str("2023-06-14T15:27:15.8440000Z").unwrap())
///     .custom("Roles", vec!["Role1", "Role2"]);
/// ```
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct User {
    #[serde(flatten)]
    attributes: HashMap<String, UserValue>,
}

impl User {
    /// Creates a [`User`] with the given identifier.
    pub fn new(identifier: &str) -> Self {
        Self {
            attributes: HashMap::from([(IDENTIFIER.to_owned(), UserValue::from(identifier))]),
        }
    }

    /// Sets the email address of the user.
    pub fn email(mut self, email: &str) -> Self {
        self.attributes.insert(EMAIL.to_owned(), email.into());
        self
    }

    /// Sets the country of the user.
    pub fn country(mut self, country: &str) -> Self {
        self.attributes.insert(COUNTRY.to_owned(), country.into());
        self
    }

    /// Sets a custom attribute (e.g. user role, subscription type, etc.).
    ///
    /// The predefined attribute names are reserved: use [`User::new`], [`User::email`] or [`User::country`] for them.
    pub fn custom<T: Into<UserValue>>(mut self, key: &str, value: T) -> Self {
        if key == IDENTIFIER || key == EMAIL || key == COUNTRY {
            return self;
        }
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    /// The user's identifier.
    pub fn identifier(&self) -> String {
        match self.attributes.get(IDENTIFIER) {
            Some(val) => val.to_string(),
            None => String::default(),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&UserValue> {
        self.attributes.get(key)
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("<invalid user>"),
        }
    }
}

fn float_to_text(val: f64) -> String {
    if val.is_nan() {
        "NaN".to_owned()
    } else if val.is_infinite() {
        if val.is_sign_positive() {
            "Infinity".to_owned()
        } else {
            "-Infinity".to_owned()
        }
    } else {
        val.to_string()
    }
}

impl UserValue {
    /// The value as text, and whether a conversion from a non-text value happened.
    pub(crate) fn as_text(&self) -> (String, bool) {
        match self {
            UserValue::String(val) => (val.clone(), false),
            UserValue::DateTime(val) => (unix_seconds(val).to_string(), true),
            other => (other.to_string(), true),
        }
    }

    pub(crate) fn as_float(&self) -> Option<f64> {
        match self {
            UserValue::String(val) => match val.trim() {
                "Infinity" | "+Infinity" => Some(f64::INFINITY),
                "-Infinity" => Some(f64::NEG_INFINITY),
                "NaN" => Some(f64::NAN),
                trimmed => trimmed.replace(',', ".").parse().ok(),
            },
            UserValue::Int(val) => Some(*val as f64),
            UserValue::UInt(val) => Some(*val as f64),
            UserValue::Float(val) => Some(*val),
            _ => None,
        }
    }

    /// Unix timestamp in seconds.
    pub(crate) fn as_timestamp(&self) -> Option<f64> {
        match self {
            UserValue::DateTime(val) => Some(unix_seconds(val)),
            _ => self.as_float(),
        }
    }

    pub(crate) fn as_semver(&self) -> Option<Version> {
        match self {
            UserValue::SemVer(val) => Some(val.clone()),
            UserValue::String(val) => Version::parse(val.trim()).ok(),
            _ => None,
        }
    }

    pub(crate) fn as_str_vec(&self) -> Option<Vec<String>> {
        match self {
            UserValue::StringVec(val) => Some(val.clone()),
            UserValue::String(val) => serde_json::from_str::<Vec<String>>(val).ok(),
            _ => None,
        }
    }
}

fn unix_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

impl From<Vec<&str>> for UserValue {
    fn from(value: Vec<&str>) -> Self {
        Self::StringVec(value.into_iter().map(str::to_owned).collect())
    }
}

impl_from_for_variant!(UserValue, String, [String]);
impl_from_for_variant!(UserValue, DateTime, [DateTime<Utc>]);
impl_from_for_variant!(UserValue, StringVec, [Vec<String>]);
impl_from_for_variant!(UserValue, SemVer, [Version]);
impl_from_for_variant!(UserValue, Float, into [f64, f32]);
impl_from_for_variant!(UserValue, UInt, into [u8, u16, u32, u64]);
impl_from_for_variant!(UserValue, Int, into [i8, i16, i32, i64]);
impl_from_for_variant!(UserValue, String, into [&str]);
