use crate::model::enums::{
    PrerequisiteFlagComparator, RedirectMode, SegmentComparator, SettingType, UserComparator,
};
use crate::value::Value;
use chrono::DateTime;
use serde::Deserialize;
use std::cmp::min;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;

const INVALID_VALUE_TXT: &str = "<invalid value>";
const STRING_LIST_MAX_LENGTH: usize = 10;

/// Error of reading a config JSON document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The document is not valid config JSON.
    #[error("JSON parsing failed. ({0})")]
    Parse(String),
}

/// Parses a config JSON document and links its settings to the segments and salt they need for evaluation.
pub(crate) fn config_from_json(json: &str) -> Result<Config, Error> {
    let mut config =
        serde_json::from_str::<Config>(json).map_err(|err| Error::Parse(err.to_string()))?;
    post_process_config(&mut config);
    Ok(config)
}

pub(crate) fn post_process_config(config: &mut Config) {
    config.salt = config
        .preferences
        .as_ref()
        .and_then(|pref| pref.salt.clone());
    let segments = config.segments.clone().unwrap_or_default();
    for setting in config.settings.values_mut() {
        setting.salt.clone_from(&config.salt);
        for rule in setting.targeting_rules.iter_mut().flatten() {
            // Rules are not shared yet at this point, so `get_mut` always succeeds.
            let Some(rule) = Arc::get_mut(rule) else {
                continue;
            };
            for condition in rule.conditions.iter_mut().flatten() {
                if let Condition::Segment(segment_condition) = condition {
                    segment_condition.segment = segments.get(segment_condition.index).cloned();
                }
            }
        }
    }
}

/// The parsed config JSON document.
#[derive(Deserialize, Debug, Default)]
pub struct Config {
    /// The dictionary of settings.
    #[serde(rename = "f", default)]
    pub settings: HashMap<String, Setting>,
    /// The list of segments.
    #[serde(rename = "s")]
    pub segments: Option<Vec<Arc<Segment>>>,
    /// The salt that was used to hash sensitive comparison values.
    #[serde(skip)]
    pub salt: Option<String>,

    #[serde(rename = "p")]
    pub(crate) preferences: Option<Preferences>,
}

/// Delivery preferences carried by the config JSON.
#[derive(Deserialize, Debug, Clone)]
pub struct Preferences {
    /// Base URL the client should download from.
    #[serde(rename = "u")]
    pub url: Option<String>,
    /// Tells how `url` has to be followed.
    #[serde(rename = "r")]
    pub redirect: Option<RedirectMode>,
    /// Salt of the hashed comparison values.
    #[serde(rename = "s")]
    pub salt: Option<String>,
}

/// Describes a feature flag or setting.
#[derive(Deserialize, Debug, Clone)]
pub struct Setting {
    /// The value that is returned when none of the targeting rules or percentage options yield a result.
    #[serde(rename = "v")]
    pub value: SettingValue,
    /// The list of percentage options.
    #[serde(rename = "p")]
    pub percentage_options: Option<Vec<Arc<PercentageOption>>>,
    /// The list of targeting rules (where there is a logical OR relation between the items).
    #[serde(rename = "r")]
    pub targeting_rules: Option<Vec<Arc<TargetingRule>>>,
    /// Variation ID (for analytical purposes).
    #[serde(rename = "i")]
    pub variation_id: Option<String>,
    /// The User Object attribute which serves as the basis of percentage options evaluation.
    #[serde(rename = "a")]
    pub percentage_attribute: Option<String>,
    /// The setting's type. It can be `bool`, `String`, `i64` or `f64`.
    #[serde(rename = "t")]
    pub setting_type: SettingType,

    #[serde(skip)]
    pub(crate) salt: Option<String>,
}

impl From<&Value> for Setting {
    fn from(value: &Value) -> Self {
        Self {
            value: value.into(),
            setting_type: value.setting_type(),
            percentage_options: None,
            targeting_rules: None,
            variation_id: None,
            percentage_attribute: None,
            salt: None,
        }
    }
}

/// Describes a segment.
#[derive(Deserialize, Debug)]
pub struct Segment {
    /// The name of the segment.
    #[serde(rename = "n")]
    pub name: String,
    /// The list of segment rule conditions (has a logical AND relation between the items).
    #[serde(rename = "r")]
    pub conditions: Vec<UserCondition>,
}

/// Describes a targeting rule.
#[derive(Deserialize, Debug)]
pub struct TargetingRule {
    /// The value served when the rule matches, `None` when the rule has a percentage options THEN part.
    #[serde(rename = "s")]
    pub served_value: Option<ServedValue>,
    /// The list of conditions that are combined with the AND logical operator.
    #[serde(rename = "c")]
    pub conditions: Option<Vec<Condition>>,
    /// The percentage options served when the rule matches, `None` when the rule has a served value THEN part.
    #[serde(rename = "p")]
    pub percentage_options: Option<Vec<Arc<PercentageOption>>>,
}

/// A targeting rule condition: one of a [`UserCondition`], a [`SegmentCondition`], or a [`PrerequisiteFlagCondition`].
#[derive(Deserialize, Debug)]
pub enum Condition {
    /// Condition that works with User Object attributes.
    #[serde(rename = "u")]
    User(UserCondition),
    /// Condition that works with a segment.
    #[serde(rename = "s")]
    Segment(SegmentCondition),
    /// Condition that works with a prerequisite flag.
    #[serde(rename = "p")]
    Prerequisite(PrerequisiteFlagCondition),
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::User(cond) => write!(f, "{cond}"),
            Condition::Segment(cond) => write!(f, "{cond}"),
            Condition::Prerequisite(cond) => write!(f, "{cond}"),
        }
    }
}

/// Describes a condition that is based on a [`crate::User`] attribute.
#[derive(Deserialize, Debug)]
pub struct UserCondition {
    /// The value that the User Object attribute is compared to, when the comparator works with a single text comparison value.
    #[serde(rename = "s")]
    pub string_val: Option<String>,
    /// The value that the User Object attribute is compared to, when the comparator works with a numeric comparison value.
    #[serde(rename = "d")]
    pub float_val: Option<f64>,
    /// The value that the User Object attribute is compared to, when the comparator works with an array of text comparison value.
    #[serde(rename = "l")]
    pub string_vec_val: Option<Vec<String>>,
    /// The operator which defines the relation between the comparison attribute and the comparison value.
    #[serde(rename = "c")]
    pub comparator: UserComparator,
    /// The User Object attribute that the condition is based on. Can be "Identifier", "Email", "Country" or any custom attribute.
    #[serde(rename = "a")]
    pub comp_attr: String,
}

impl Display for UserCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User.{} {} ", self.comp_attr, self.comparator)?;
        if let Some(num) = self.float_val {
            if !self.comparator.is_date() {
                return write!(f, "'{num}'");
            }
            return match DateTime::from_timestamp_millis((num * 1000.0) as i64) {
                Some(date) => write!(f, "'{num}' ({})", date.format("%Y-%m-%dT%H:%M:%S%.3f UTC")),
                None => write!(f, "'{num}'"),
            };
        }
        if let Some(text) = self.string_val.as_ref() {
            return if self.comparator.is_sensitive() {
                f.write_str("'<hashed value>'")
            } else {
                write!(f, "'{text}'")
            };
        }
        if let Some(vec) = self.string_vec_val.as_ref() {
            let len = vec.len();
            if self.comparator.is_sensitive() {
                let val_t = if len > 1 { "values" } else { "value" };
                return write!(f, "[<{len} hashed {val_t}>]");
            }
            let shown = vec
                .iter()
                .take(min(len, STRING_LIST_MAX_LENGTH))
                .map(|item| format!("'{item}'"))
                .collect::<Vec<String>>()
                .join(", ");
            return if len > STRING_LIST_MAX_LENGTH {
                let rest = len - STRING_LIST_MAX_LENGTH;
                let val_t = if rest > 1 { "values" } else { "value" };
                write!(f, "[{shown}, ... <{rest} more {val_t}>]")
            } else {
                write!(f, "[{shown}]")
            };
        }
        f.write_str(INVALID_VALUE_TXT)
    }
}

/// Describes a condition that is based on a [`Segment`].
#[derive(Deserialize, Debug)]
pub struct SegmentCondition {
    /// Index of the segment in the config JSON's segment list.
    #[serde(rename = "s")]
    pub index: usize,
    /// The operator which defines the expected result of the evaluation of the segment.
    #[serde(rename = "c")]
    pub segment_comparator: SegmentComparator,

    #[serde(skip)]
    pub(crate) segment: Option<Arc<Segment>>,
}

impl Display for SegmentCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self.segment.as_ref() {
            Some(seg) => seg.name.as_str(),
            None => "<invalid name>",
        };
        write!(f, "User {} '{name}'", self.segment_comparator)
    }
}

/// Describes a condition that is based on a prerequisite flag.
#[derive(Deserialize, Debug)]
pub struct PrerequisiteFlagCondition {
    /// The key of the prerequisite flag that the condition is based on.
    #[serde(rename = "f")]
    pub flag_key: String,
    /// The operator which defines the relation between the evaluated value of the prerequisite flag and the comparison value.
    #[serde(rename = "c")]
    pub prerequisite_comparator: PrerequisiteFlagComparator,
    /// The value the evaluated value of the prerequisite flag is compared to.
    #[serde(rename = "v")]
    pub flag_value: SettingValue,
}

impl Display for PrerequisiteFlagCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Flag '{}' {} '{}'",
            self.flag_key, self.prerequisite_comparator, self.flag_value
        )
    }
}

/// Describes a percentage option.
#[derive(Deserialize, Debug)]
pub struct PercentageOption {
    /// The served value of the percentage option.
    #[serde(rename = "v")]
    pub served_value: SettingValue,
    /// A number between 0 and 100 that represents a randomly allocated fraction of the users.
    #[serde(rename = "p")]
    pub percentage: i64,
    /// Variation ID (for analytical purposes).
    #[serde(rename = "i")]
    pub variation_id: Option<String>,
}

/// Describes a setting value along with related data.
#[derive(Deserialize, Debug)]
pub struct ServedValue {
    /// The value associated with the targeting rule.
    #[serde(rename = "v")]
    pub value: SettingValue,
    /// Variation ID (for analytical purposes).
    #[serde(rename = "i")]
    pub variation_id: Option<String>,
}

/// Describes a setting's value as it appears in the config JSON.
///
/// Exactly one field is expected to be set, the one matching the setting's [`SettingType`].
#[derive(Deserialize, Clone, Debug, Default)]
pub struct SettingValue {
    /// Holds a bool feature flag's value.
    #[serde(rename = "b")]
    pub bool_val: Option<bool>,
    /// Holds a string setting's value.
    #[serde(rename = "s")]
    pub string_val: Option<String>,
    /// Holds a decimal number setting's value.
    #[serde(rename = "d")]
    pub float_val: Option<f64>,
    /// Holds a whole number setting's value.
    #[serde(rename = "i")]
    pub int_val: Option<i64>,
}

impl SettingValue {
    /// Reads the field that belongs to `setting_type`; [`None`] when it's absent.
    pub(crate) fn as_val(&self, setting_type: &SettingType) -> Option<Value> {
        match setting_type {
            SettingType::Bool => self.bool_val.map(Value::Bool),
            SettingType::String => self.string_val.clone().map(Value::String),
            SettingType::Int => self.int_val.map(Value::Int),
            SettingType::Float => self.float_val.map(Value::Float),
        }
    }

    pub(crate) fn eq_by_type(&self, other: &Value, setting_type: &SettingType) -> bool {
        self.as_val(setting_type).is_some_and(|val| val == *other)
    }
}

impl From<&Value> for SettingValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(val) => Self {
                bool_val: Some(*val),
                ..Self::default()
            },
            Value::Int(val) => Self {
                int_val: Some(*val),
                ..Self::default()
            },
            Value::Float(val) => Self {
                float_val: Some(*val),
                ..Self::default()
            },
            Value::String(val) => Self {
                string_val: Some(val.clone()),
                ..Self::default()
            },
        }
    }
}

impl Display for SettingValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(b) = self.bool_val.as_ref() {
            write!(f, "{b}")
        } else if let Some(s) = self.string_val.as_ref() {
            f.write_str(s)
        } else if let Some(fl) = self.float_val.as_ref() {
            write!(f, "{fl}")
        } else if let Some(i) = self.int_val.as_ref() {
            write!(f, "{i}")
        } else {
            f.write_str(INVALID_VALUE_TXT)
        }
    }
}
