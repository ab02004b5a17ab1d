use crate::errors::{EvaluationError, EvaluationErrorCode};
use crate::model::config::{PercentageOption, TargetingRule};
use crate::user::User;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The outcome of evaluating one feature flag or setting against a config snapshot.
#[derive(Debug, Clone, Default)]
pub struct EvaluationResult {
    /// Key of the evaluated feature flag or setting.
    pub key: String,
    /// The evaluated value, or the supplied default when the evaluation failed.
    pub value: Option<Value>,
    /// `true` when `value` is the supplied default.
    pub is_default_value: bool,
    /// Variation ID of the served value (if available).
    pub variation_id: Option<String>,
    /// The targeting rule that decided the outcome (if any).
    pub matched_targeting_rule: Option<Arc<TargetingRule>>,
    /// The percentage option that decided the outcome (if any).
    pub matched_percentage_option: Option<Arc<PercentageOption>>,
    /// The reason of a failed evaluation.
    pub error: Option<EvaluationError>,
}

impl EvaluationResult {
    pub(crate) fn failure(
        key: &str,
        default: Option<&Value>,
        code: EvaluationErrorCode,
        message: String,
    ) -> Self {
        Self {
            key: key.to_owned(),
            value: default.cloned(),
            is_default_value: true,
            error: Some(EvaluationError::new(code, message)),
            ..EvaluationResult::default()
        }
    }

    /// The error code of the evaluation, [`EvaluationErrorCode::None`] on success.
    pub fn error_code(&self) -> EvaluationErrorCode {
        self.error
            .as_ref()
            .map(|err| err.code)
            .unwrap_or(EvaluationErrorCode::None)
    }
}

/// Details of the flag evaluation's result.
#[derive(Debug, Clone, Default)]
pub struct EvaluationDetails<T> {
    /// The evaluated value.
    pub value: T,
    /// Key of the feature flag or setting.
    pub key: String,
    /// Indicates whether the default value passed to the setting evaluation methods is used as the result of the evaluation.
    pub is_default_value: bool,
    /// Variation ID of the feature flag or setting (if available).
    pub variation_id: Option<String>,
    /// The User Object used for the evaluation (if available).
    pub user: Option<User>,
    /// Error in case evaluation failed.
    pub error: Option<EvaluationError>,
    /// Time of last successful config download.
    pub fetch_time: Option<DateTime<Utc>>,
    /// The targeting rule (if any) that matched during the evaluation and was used to return the evaluated value.
    pub matched_targeting_rule: Option<Arc<TargetingRule>>,
    /// The percentage option (if any) that was used to select the evaluated value.
    pub matched_percentage_option: Option<Arc<PercentageOption>>,
}

impl<T> EvaluationDetails<T> {
    pub(crate) fn from_result(
        value: T,
        result: EvaluationResult,
        user: Option<User>,
        fetch_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            value,
            key: result.key,
            is_default_value: result.is_default_value,
            variation_id: result.variation_id,
            user,
            error: result.error,
            fetch_time,
            matched_targeting_rule: result.matched_targeting_rule,
            matched_percentage_option: result.matched_percentage_option,
        }
    }
}
