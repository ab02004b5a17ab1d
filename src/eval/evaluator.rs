use crate::errors::EvaluationErrorCode;
use crate::eval::details::EvaluationResult;
use crate::eval::evaluator::ConditionResult::*;
use crate::eval::log_builder::EvalLogBuilder;
use crate::model::config::{
    Condition, PercentageOption, PrerequisiteFlagCondition, SegmentCondition, Setting,
    SettingValue, TargetingRule, UserCondition,
};
use crate::model::enums::{PrerequisiteFlagComparator, SegmentComparator, UserComparator};
use crate::user::{User, UserValue, IDENTIFIER};
use crate::utils::{sha1, sha256};
use crate::value::{OptionalValueDisplay, Value};
use log::{error, info, log_enabled, warn};
use semver::Version;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

macro_rules! eval_log_enabled {
    () => {
        log_enabled!(log::Level::Info)
    };
}

const SALT_MISSING_MSG: &str = "Config JSON salt is missing";
const COMP_VAL_INVALID_MSG: &str = "Comparison value is missing or invalid";

/// The outcome of a single condition.
pub(crate) enum ConditionResult {
    Done(bool),
    NoUser,
    /// Attribute name, condition text.
    AttrMissing(String, String),
    /// Reason, attribute name, condition text.
    AttrInvalid(String, String, String),
    Fatal(String),
}

impl ConditionResult {
    fn is_match(&self) -> bool {
        matches!(self, Done(true))
    }
}

impl Display for ConditionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Done(_) => f.write_str(""),
            NoUser => f.write_str("cannot evaluate, User Object is missing"),
            AttrMissing(attr, _) => {
                write!(f, "cannot evaluate, the User.{attr} attribute is missing")
            }
            AttrInvalid(reason, attr, _) => write!(
                f,
                "cannot evaluate, the User.{attr} attribute is invalid ({reason})"
            ),
            Fatal(err) => write!(f, "cannot evaluate ({err})"),
        }
    }
}

struct Matched<'a> {
    value: &'a SettingValue,
    variation_id: Option<&'a String>,
    rule: Option<Arc<TargetingRule>>,
    option: Option<Arc<PercentageOption>>,
}

/// Evaluates the setting identified by `key`.
///
/// `settings` is [`None`] when no config JSON is available. The result always carries a value
/// when `default` is given: the evaluated one on success, `default` otherwise.
pub fn evaluate(
    settings: Option<&HashMap<String, Setting>>,
    key: &str,
    default: Option<&Value>,
    user: Option<&User>,
) -> EvaluationResult {
    let Some(settings) = settings else {
        return failed(
            key,
            default,
            EvaluationErrorCode::ConfigJsonNotAvailable,
            format!("Config JSON is not present when evaluating setting '{key}'. Returning the `defaultValue` parameter that you specified in your application: '{}'.", default.to_str()),
        );
    };
    let Some(setting) = settings.get(key) else {
        let mut keys = settings
            .keys()
            .map(|k| format!("'{k}'"))
            .collect::<Vec<String>>();
        keys.sort();
        return failed(
            key,
            default,
            EvaluationErrorCode::SettingKeyMissing,
            format!("Failed to evaluate setting '{key}' (the key was not found in config JSON). Returning the `defaultValue` parameter that you specified in your application: '{}'. Available keys: [{}].", default.to_str(), keys.join(", ")),
        );
    };
    if let Some(default) = default {
        if default.setting_type() != setting.setting_type {
            return failed(
                key,
                Some(default),
                EvaluationErrorCode::SettingValueTypeMismatch,
                format!("The type of a setting must match the type of the specified default value. Setting's type was '{}' but the default value's type was '{}'. Please use a default value which corresponds to the setting type '{}'. Learn more: https://configcat.com/docs/sdk-reference/rust/#setting-type-mapping", setting.setting_type, default.setting_type(), setting.setting_type),
            );
        }
    }

    let mut log = EvalLogBuilder::default();
    if eval_log_enabled!() {
        log.append(&format!("Evaluating '{key}'"));
        if let Some(user) = user {
            log.append(&format!(" for User '{user}'"));
        }
        log.inc_indent();
    }
    let mut visited = vec![key.to_owned()];
    let outcome = eval_setting(setting, key, user, &mut log, settings, &mut visited);
    let result = match outcome {
        Ok(matched) => match matched.value.as_val(&setting.setting_type) {
            Some(value) => EvaluationResult {
                key: key.to_owned(),
                value: Some(value),
                is_default_value: false,
                variation_id: matched.variation_id.cloned(),
                matched_targeting_rule: matched.rule,
                matched_percentage_option: matched.option,
                error: None,
            },
            None => failed(
                key,
                default,
                EvaluationErrorCode::InvalidConfigModel,
                format!("Failed to evaluate setting '{key}' (Setting value is null or invalid). Returning the `defaultValue` parameter that you specified in your application: '{}'.", default.to_str()),
            ),
        },
        Err(reason) => failed(
            key,
            default,
            EvaluationErrorCode::InvalidConfigModel,
            format!("Failed to evaluate setting '{key}' ({reason}). Returning the `defaultValue` parameter that you specified in your application: '{}'.", default.to_str()),
        ),
    };
    if eval_log_enabled!() {
        log.new_ln(Some(&format!(
            "Returning '{}'.",
            result.value.as_ref().to_str()
        )));
        info!(event_id = 5000; "{}", log.content());
    }
    result
}

fn failed(
    key: &str,
    default: Option<&Value>,
    code: EvaluationErrorCode,
    message: String,
) -> EvaluationResult {
    error!(event_id = code.event_id(); "{message}");
    EvaluationResult::failure(key, default, code, message)
}

fn eval_setting<'a>(
    setting: &'a Setting,
    key: &str,
    user: Option<&User>,
    log: &mut EvalLogBuilder,
    settings: &'a HashMap<String, Setting>,
    visited: &mut Vec<String>,
) -> Result<Matched<'a>, String> {
    let mut user_missing_reported = false;
    let salt = setting.salt.as_deref();

    if let Some(rules) = setting.targeting_rules.as_ref().filter(|r| !r.is_empty()) {
        if eval_log_enabled!() {
            log.new_ln(Some(
                "Evaluating targeting rules and applying the first match if any:",
            ));
        }
        for rule in rules {
            let conditions = rule.conditions.as_deref().unwrap_or_default();
            match eval_conditions(conditions, rule, key, user, salt, log, settings, visited) {
                Done(true) => {}
                Done(false) => continue,
                Fatal(err) => return Err(err),
                skipped => {
                    warn_skipped(&skipped, key, &mut user_missing_reported);
                    continue;
                }
            }
            if let Some(served) = rule.served_value.as_ref() {
                return Ok(Matched {
                    value: &served.value,
                    variation_id: served.variation_id.as_ref(),
                    rule: Some(rule.clone()),
                    option: None,
                });
            }
            let Some(options) = rule.percentage_options.as_ref().filter(|o| !o.is_empty())
            else {
                return Err("Targeting rule THEN part is missing or invalid".to_owned());
            };
            if eval_log_enabled!() {
                log.inc_indent();
            }
            let selected = eval_percentage_options(
                options,
                setting,
                key,
                user,
                log,
                &mut user_missing_reported,
            )?;
            if eval_log_enabled!() {
                log.dec_indent();
            }
            match selected {
                Some(option) => {
                    return Ok(Matched {
                        value: &option.served_value,
                        variation_id: option.variation_id.as_ref(),
                        rule: Some(rule.clone()),
                        option: Some(option.clone()),
                    })
                }
                None => {
                    if eval_log_enabled!() {
                        log.inc_indent()
                            .new_ln(Some("The current targeting rule is ignored and the evaluation continues with the next rule."))
                            .dec_indent();
                    }
                }
            }
        }
    }

    if let Some(options) = setting.percentage_options.as_ref().filter(|o| !o.is_empty()) {
        if let Some(option) =
            eval_percentage_options(options, setting, key, user, log, &mut user_missing_reported)?
        {
            return Ok(Matched {
                value: &option.served_value,
                variation_id: option.variation_id.as_ref(),
                rule: None,
                option: Some(option.clone()),
            });
        }
    }

    Ok(Matched {
        value: &setting.value,
        variation_id: setting.variation_id.as_ref(),
        rule: None,
        option: None,
    })
}

fn warn_skipped(result: &ConditionResult, key: &str, user_missing_reported: &mut bool) {
    match result {
        NoUser => warn_user_missing(key, user_missing_reported),
        AttrMissing(attr, cond) => {
            warn!(event_id = 3003; "Cannot evaluate condition ({cond}) for setting '{key}' (the User.{attr} attribute is missing). You should set the User.{attr} attribute in order to make targeting work properly. Read more: https://configcat.com/docs/advanced/user-object/")
        }
        AttrInvalid(reason, attr, cond) => {
            warn!(event_id = 3004; "Cannot evaluate condition ({cond}) for setting '{key}' ({reason}). Please check the User.{attr} attribute and make sure that its value corresponds to the comparison operator.")
        }
        Done(_) | Fatal(_) => {}
    }
}

fn warn_user_missing(key: &str, reported: &mut bool) {
    if *reported {
        return;
    }
    *reported = true;
    warn!(event_id = 3001; "Cannot evaluate targeting rules and % options for setting '{key}' (User Object is missing). You should pass a User Object to the evaluation methods like `get_value()` in order to make targeting work properly. Read more: https://configcat.com/docs/advanced/user-object/");
}

/// Computes the stable `[0, 100)` bucket of a user for a setting.
pub(crate) fn percentage_bucket(key: &str, attr_value: &str) -> Result<i64, String> {
    let hash = sha1(&format!("{key}{attr_value}"));
    let prefix = hash.get(..7).ok_or_else(|| "Invalid hash".to_owned())?;
    let num = i64::from_str_radix(prefix, 16).map_err(|err| err.to_string())?;
    Ok(num % 100)
}

fn eval_percentage_options<'a>(
    options: &'a [Arc<PercentageOption>],
    setting: &Setting,
    key: &str,
    user: Option<&User>,
    log: &mut EvalLogBuilder,
    user_missing_reported: &mut bool,
) -> Result<Option<&'a Arc<PercentageOption>>, String> {
    let Some(user) = user else {
        warn_user_missing(key, user_missing_reported);
        if eval_log_enabled!() {
            log.new_ln(Some(
                "Skipping % options because the User Object is missing.",
            ));
        }
        return Ok(None);
    };
    let attr = setting
        .percentage_attribute
        .as_deref()
        .unwrap_or(IDENTIFIER);
    let Some(attr_value) = user.get(attr) else {
        if eval_log_enabled!() {
            log.new_ln(Some(&format!(
                "Skipping % options because the User.{attr} attribute is missing."
            )));
        }
        return Ok(None);
    };
    let (text, _) = attr_value.as_text();
    let bucket = percentage_bucket(key, &text)?;
    if eval_log_enabled!() {
        log.new_ln(Some(&format!(
            "Evaluating % options based on the User.{attr} attribute:"
        )))
        .new_ln(Some(&format!(
            "- Computing hash in the [0..99] range from User.{attr} => {bucket} (this value is sticky and consistent across all SDKs)"
        )));
    }

    let mut bucket_end = 0;
    for (index, option) in options.iter().enumerate() {
        bucket_end += option.percentage;
        if bucket < bucket_end {
            if eval_log_enabled!() {
                log.new_ln(Some(&format!(
                    "- Hash value {bucket} selects % option {} ({}%), '{}'.",
                    index + 1,
                    option.percentage,
                    option.served_value
                )));
            }
            return Ok(Some(option));
        }
    }
    Err("Sum of percentage option percentages is less than 100".to_owned())
}

#[allow(clippy::too_many_arguments)]
fn eval_conditions(
    conditions: &[Condition],
    rule: &TargetingRule,
    key: &str,
    user: Option<&User>,
    salt: Option<&str>,
    log: &mut EvalLogBuilder,
    settings: &HashMap<String, Setting>,
    visited: &mut Vec<String>,
) -> ConditionResult {
    if eval_log_enabled!() {
        log.new_ln(Some("- "));
    }
    let mut new_line_before_then = false;
    for (index, condition) in conditions.iter().enumerate() {
        if eval_log_enabled!() {
            if index == 0 {
                log.append("IF ").inc_indent();
            } else {
                log.inc_indent().new_ln(Some("AND "));
            }
            log.append(&condition.to_string());
        }
        let result = match condition {
            Condition::User(user_condition) => {
                new_line_before_then = conditions.len() > 1;
                match user {
                    Some(user) => eval_user_cond(user_condition, key, user, salt, key),
                    None => NoUser,
                }
            }
            Condition::Segment(segment_condition) => {
                let result = match user {
                    Some(user) => eval_segment_cond(segment_condition, key, user, salt, log),
                    None => NoUser,
                };
                new_line_before_then = matches!(result, Done(_) | AttrMissing(..))
                    || conditions.len() > 1;
                result
            }
            Condition::Prerequisite(prerequisite_condition) => {
                new_line_before_then = true;
                eval_prerequisite_cond(prerequisite_condition, user, log, settings, visited)
            }
        };
        let matched = result.is_match();
        if eval_log_enabled!() {
            if conditions.len() > 1 {
                log.append(if matched { " => true" } else { " => false" });
                if !matched {
                    log.append(", skipping the remaining AND conditions");
                }
            }
            log.dec_indent();
        }
        if !matched {
            if eval_log_enabled!() {
                log.append_then_clause(new_line_before_then, &result, rule);
            }
            return result;
        }
    }
    if eval_log_enabled!() {
        log.append_then_clause(new_line_before_then, &Done(true), rule);
    }
    Done(true)
}

fn eval_prerequisite_cond(
    cond: &PrerequisiteFlagCondition,
    user: Option<&User>,
    log: &mut EvalLogBuilder,
    settings: &HashMap<String, Setting>,
    visited: &mut Vec<String>,
) -> ConditionResult {
    let Some(prerequisite) = settings.get(&cond.flag_key) else {
        return Fatal("Prerequisite flag is missing or invalid".to_owned());
    };
    let Some(expected) = cond.flag_value.as_val(&prerequisite.setting_type) else {
        return Fatal(format!(
            "Type mismatch between comparison value '{}' and prerequisite flag '{}'",
            cond.flag_value, cond.flag_key
        ));
    };
    if visited.contains(&cond.flag_key) {
        let path = visited
            .iter()
            .chain(std::iter::once(&cond.flag_key))
            .map(|k| format!("'{k}'"))
            .collect::<Vec<String>>()
            .join(" -> ");
        return Fatal(format!(
            "Circular dependency detected between the following depending flags: {path}"
        ));
    }

    if eval_log_enabled!() {
        log.new_ln(Some("(")).inc_indent().new_ln(Some(&format!(
            "Evaluating prerequisite flag '{}':",
            cond.flag_key
        )));
    }
    visited.push(cond.flag_key.clone());
    let result = eval_setting(prerequisite, &cond.flag_key, user, log, settings, visited);
    visited.pop();

    let matched = match result {
        Ok(matched) => matched,
        Err(err) => return Fatal(err),
    };
    let Some(actual) = matched.value.as_val(&prerequisite.setting_type) else {
        return Fatal("Setting value is null or invalid".to_owned());
    };
    let needs_equal = cond.prerequisite_comparator == PrerequisiteFlagComparator::Eq;
    let result = (actual == expected) == needs_equal;
    if eval_log_enabled!() {
        log.new_ln(Some(&format!(
            "Prerequisite flag evaluation result: '{actual}'."
        )))
        .new_ln(Some(&format!("Condition ({cond}) evaluates to {result}.")))
        .dec_indent()
        .new_ln(Some(")"));
    }
    Done(result)
}

fn eval_segment_cond(
    cond: &SegmentCondition,
    key: &str,
    user: &User,
    salt: Option<&str>,
    log: &mut EvalLogBuilder,
) -> ConditionResult {
    let Some(segment) = cond.segment.as_ref() else {
        return Fatal("Segment reference is invalid".to_owned());
    };
    if eval_log_enabled!() {
        log.new_ln(Some("(")).inc_indent().new_ln(Some(&format!(
            "Evaluating segment '{}':",
            segment.name
        )));
    }

    let mut result = Done(true);
    for (index, user_condition) in segment.conditions.iter().enumerate() {
        if eval_log_enabled!() {
            log.new_ln(Some("- "));
            if index == 0 {
                log.append("IF ").inc_indent();
            } else {
                log.inc_indent().new_ln(Some("AND "));
            }
            log.append(&user_condition.to_string());
        }
        result = eval_user_cond(user_condition, key, user, salt, &segment.name);
        if eval_log_enabled!() {
            log.append(if result.is_match() { " => true" } else { " => false" });
            if !result.is_match() {
                log.append(", skipping the remaining AND conditions");
            }
            log.dec_indent();
        }
        if !result.is_match() {
            break;
        }
    }

    let needs_true = cond.segment_comparator == SegmentComparator::IsIn;
    if eval_log_enabled!() {
        log.new_ln(Some("Segment evaluation result: "));
        match &result {
            Done(in_segment) => {
                let comp = if *in_segment {
                    SegmentComparator::IsIn
                } else {
                    SegmentComparator::IsNotIn
                };
                log.append(&format!("User {comp}."));
            }
            other => {
                log.append(&format!("{other}."));
            }
        }
        log.new_ln(Some(&format!("Condition ({cond})")));
        match &result {
            Done(in_segment) => {
                log.append(&format!(" evaluates to {}.", *in_segment == needs_true));
            }
            _ => {
                log.append(" failed to evaluate.");
            }
        }
        log.dec_indent().new_ln(Some(")"));
    }
    match result {
        Done(in_segment) => Done(in_segment == needs_true),
        other => other,
    }
}

fn eval_user_cond(
    cond: &UserCondition,
    key: &str,
    user: &User,
    salt: Option<&str>,
    ctx_salt: &str,
) -> ConditionResult {
    use UserComparator::*;

    let Some(user_attr) = user.get(&cond.comp_attr) else {
        return AttrMissing(cond.comp_attr.clone(), cond.to_string());
    };
    let comp = cond.comparator;
    match comp {
        Eq | NotEq | EqHashed | NotEqHashed => {
            let Some(comp_val) = cond.string_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let user_val = text_of(cond, key, user_attr);
            let user_val = if comp.is_sensitive() {
                match hashed(user_val.as_bytes(), salt, ctx_salt) {
                    Ok(hash) => hash,
                    Err(err) => return err,
                }
            } else {
                user_val
            };
            Done((user_val == *comp_val) == comp.is_positive())
        }
        OneOf | NotOneOf | OneOfHashed | NotOneOfHashed => {
            let Some(comp_val) = cond.string_vec_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let user_val = text_of(cond, key, user_attr);
            let user_val = if comp.is_sensitive() {
                match hashed(user_val.as_bytes(), salt, ctx_salt) {
                    Ok(hash) => hash,
                    Err(err) => return err,
                }
            } else {
                user_val
            };
            Done(comp_val.contains(&user_val) == comp.is_positive())
        }
        StartsWithAnyOf | NotStartsWithAnyOf | EndsWithAnyOf | NotEndsWithAnyOf
        | StartsWithAnyOfHashed | NotStartsWithAnyOfHashed | EndsWithAnyOfHashed
        | NotEndsWithAnyOfHashed => {
            let Some(comp_val) = cond.string_vec_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let user_val = text_of(cond, key, user_attr);
            eval_starts_ends_with(comp_val, &user_val, comp, salt, ctx_salt)
        }
        Contains | NotContains => {
            let Some(comp_val) = cond.string_vec_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let user_val = text_of(cond, key, user_attr);
            let found = comp_val.iter().any(|item| user_val.contains(item.as_str()));
            Done(found == comp.is_positive())
        }
        OneOfSemver | NotOneOfSemver => {
            let Some(comp_val) = cond.string_vec_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let Some(user_val) = user_attr.as_semver() else {
                return invalid_attr(cond, user_attr, "is not a valid semantic version");
            };
            eval_semver_is_one_of(comp_val, &user_val, comp)
        }
        LessSemver | LessEqSemver | GreaterSemver | GreaterEqSemver => {
            let Some(comp_val) = cond.string_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let Some(user_val) = user_attr.as_semver() else {
                return invalid_attr(cond, user_attr, "is not a valid semantic version");
            };
            eval_semver_compare(comp_val, &user_val, comp)
        }
        EqNum | NotEqNum | LessNum | LessEqNum | GreaterNum | GreaterEqNum => {
            let Some(comp_val) = cond.float_val else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let Some(user_val) = user_attr.as_float() else {
                return invalid_attr(cond, user_attr, "is not a valid decimal number");
            };
            eval_number_compare(comp_val, user_val, comp)
        }
        BeforeDateTime | AfterDateTime => {
            let Some(comp_val) = cond.float_val else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let Some(user_val) = user_attr.as_timestamp() else {
                return invalid_attr(
                    cond,
                    user_attr,
                    "is not a valid Unix timestamp (number of seconds elapsed since Unix epoch)",
                );
            };
            if comp == BeforeDateTime {
                Done(user_val < comp_val)
            } else {
                Done(user_val > comp_val)
            }
        }
        ArrayContainsAnyOf
        | ArrayNotContainsAnyOf
        | ArrayContainsAnyOfHashed
        | ArrayNotContainsAnyOfHashed => {
            let Some(comp_val) = cond.string_vec_val.as_ref() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let Some(user_val) = user_attr.as_str_vec() else {
                return invalid_attr(cond, user_attr, "is not a valid string array");
            };
            let mut found = false;
            for item in &user_val {
                let item = if comp.is_sensitive() {
                    match hashed(item.as_bytes(), salt, ctx_salt) {
                        Ok(hash) => hash,
                        Err(err) => return err,
                    }
                } else {
                    item.clone()
                };
                if comp_val.contains(&item) {
                    found = true;
                    break;
                }
            }
            Done(found == comp.is_positive())
        }
    }
}

fn hashed(payload: &[u8], salt: Option<&str>, ctx_salt: &str) -> Result<String, ConditionResult> {
    match salt {
        Some(salt) => Ok(sha256(payload, salt, ctx_salt)),
        None => Err(Fatal(SALT_MISSING_MSG.to_owned())),
    }
}

fn text_of(cond: &UserCondition, key: &str, user_attr: &UserValue) -> String {
    let (text, converted) = user_attr.as_text();
    if converted {
        warn!(event_id = 3005; "Evaluation of condition ({cond}) for setting '{key}' may not produce the expected result (the User.{} attribute is not a string value, thus it was automatically converted to the string value '{text}'). Please make sure that using a non-string value was intended.", cond.comp_attr);
    }
    text
}

fn invalid_attr(cond: &UserCondition, user_attr: &UserValue, reason: &str) -> ConditionResult {
    AttrInvalid(
        format!("'{user_attr}' {reason}"),
        cond.comp_attr.clone(),
        cond.to_string(),
    )
}

fn eval_starts_ends_with(
    comp_val: &[String],
    user_val: &str,
    comp: UserComparator,
    salt: Option<&str>,
    ctx_salt: &str,
) -> ConditionResult {
    let user_bytes = user_val.as_bytes();
    for item in comp_val {
        let found = if comp.is_sensitive() {
            let Some((length, hash)) = item.split_once('_') else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            let Ok(length) = length.trim().parse::<usize>() else {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            };
            if hash.is_empty() {
                return Fatal(COMP_VAL_INVALID_MSG.to_owned());
            }
            if length > user_bytes.len() {
                continue;
            }
            let chunk = if comp.is_starts_with() {
                &user_bytes[..length]
            } else {
                &user_bytes[user_bytes.len() - length..]
            };
            match hashed(chunk, salt, ctx_salt) {
                Ok(chunk_hash) => chunk_hash == hash,
                Err(err) => return err,
            }
        } else if comp.is_starts_with() {
            user_val.starts_with(item.as_str())
        } else {
            user_val.ends_with(item.as_str())
        };
        if found {
            return Done(comp.is_positive());
        }
    }
    Done(!comp.is_positive())
}

fn eval_semver_is_one_of(
    comp_val: &[String],
    user_val: &Version,
    comp: UserComparator,
) -> ConditionResult {
    let mut matched = false;
    for item in comp_val {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(comp_ver) = Version::parse(trimmed) else {
            // Invalid versions in the list make the condition fail instead of aborting the evaluation.
            return Done(false);
        };
        matched |= *user_val == comp_ver;
    }
    Done(matched == comp.is_positive())
}

fn eval_semver_compare(
    comp_val: &str,
    user_val: &Version,
    comp: UserComparator,
) -> ConditionResult {
    let Ok(comp_ver) = Version::parse(comp_val.trim()) else {
        return Done(false);
    };
    match comp {
        UserComparator::LessSemver => Done(*user_val < comp_ver),
        UserComparator::LessEqSemver => Done(*user_val <= comp_ver),
        UserComparator::GreaterSemver => Done(*user_val > comp_ver),
        _ => Done(*user_val >= comp_ver),
    }
}

fn eval_number_compare(comp_val: f64, user_val: f64, comp: UserComparator) -> ConditionResult {
    match comp {
        UserComparator::EqNum => Done(user_val == comp_val),
        UserComparator::NotEqNum => Done(user_val != comp_val),
        UserComparator::LessNum => Done(user_val < comp_val),
        UserComparator::LessEqNum => Done(user_val <= comp_val),
        UserComparator::GreaterNum => Done(user_val > comp_val),
        _ => Done(user_val >= comp_val),
    }
}
