use serde_repr::Deserialize_repr;
use std::fmt::{Display, Formatter};

/// Describes the location of your feature flag and setting data within the ConfigCat CDN.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum DataGovernance {
    /// Select this if your feature flags are published to all global CDN nodes.
    #[default]
    Global,
    /// Select this if your feature flags are published to CDN nodes only in the EU.
    EU,
}

/// Tells the client whether it should move to the base URL found in the downloaded config JSON.
#[derive(Debug, Deserialize_repr, PartialEq, Clone, Copy)]
#[repr(u8)]
pub enum RedirectMode {
    /// Stay on the current base URL.
    No = 0,
    /// Move to the preferred base URL unless a custom one was configured.
    Should = 1,
    /// Always move to the preferred base URL.
    Force = 2,
}

/// Describes how much the client can trust the config data it holds.
///
/// The variants are ordered by freshness: `NoFlagData < HasCachedFlagDataOnly < HasUpToDateFlagData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClientCacheState {
    /// No config data is available, evaluations return the default values.
    NoFlagData,
    /// Config data is available only from the cache and it may be stale.
    HasCachedFlagDataOnly,
    /// Config data was recently fetched or is within its expiration window.
    HasUpToDateFlagData,
    /// The client works only from local flag overrides.
    HasLocalOverrideFlagDataOnly,
}

/// The type of a feature flag or setting.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum SettingType {
    /// The on/off type (feature flag).
    Bool = 0,
    /// The text setting type.
    String = 1,
    /// The whole number setting type.
    Int = 2,
    /// The decimal number setting type.
    Float = 3,
}

impl Display for SettingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SettingType::Bool => "Bool",
            SettingType::String => "String",
            SettingType::Int => "Int",
            SettingType::Float => "Float",
        })
    }
}

/// Segment comparison operator used during the evaluation process.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum SegmentComparator {
    /// Checks whether the conditions of the specified segment are evaluated to true.
    IsIn = 0,
    /// Checks whether the conditions of the specified segment are evaluated to false.
    IsNotIn = 1,
}

impl Display for SegmentComparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SegmentComparator::IsIn => "IS IN SEGMENT",
            SegmentComparator::IsNotIn => "IS NOT IN SEGMENT",
        })
    }
}

/// Prerequisite flag comparison operator used during the evaluation process.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum PrerequisiteFlagComparator {
    /// Checks whether the evaluated value of the specified prerequisite flag is equal to the comparison value.
    Eq = 0,
    /// Checks whether the evaluated value of the specified prerequisite flag is not equal to the comparison value.
    NotEq = 1,
}

impl Display for PrerequisiteFlagComparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PrerequisiteFlagComparator::Eq => "EQUALS",
            PrerequisiteFlagComparator::NotEq => "NOT EQUALS",
        })
    }
}

/// User Object attribute comparison operator used during the evaluation process.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub enum UserComparator {
    /// Checks whether the comparison attribute is equal to any of the comparison values.
    OneOf = 0,
    /// Checks whether the comparison attribute is not equal to any of the comparison values.
    NotOneOf = 1,
    /// Checks whether the comparison attribute contains any comparison values as a substring.
    Contains = 2,
    /// Checks whether the comparison attribute does not contain any comparison values as a substring.
    NotContains = 3,
    /// Checks whether the comparison attribute interpreted as a semantic version is equal to any of the comparison values.
    OneOfSemver = 4,
    /// Checks whether the comparison attribute interpreted as a semantic version is not equal to any of the comparison values.
    NotOneOfSemver = 5,
    /// Checks whether the comparison attribute interpreted as a semantic version is less than the comparison value.
    LessSemver = 6,
    /// Checks whether the comparison attribute interpreted as a semantic version is less than or equal to the comparison value.
    LessEqSemver = 7,
    /// Checks whether the comparison attribute interpreted as a semantic version is greater than the comparison value.
    GreaterSemver = 8,
    /// Checks whether the comparison attribute interpreted as a semantic version is greater than or equal to the comparison value.
    GreaterEqSemver = 9,
    /// Checks whether the comparison attribute interpreted as a decimal number is equal to the comparison value.
    EqNum = 10,
    /// Checks whether the comparison attribute interpreted as a decimal number is not equal to the comparison value.
    NotEqNum = 11,
    /// Checks whether the comparison attribute interpreted as a decimal number is less than the comparison value.
    LessNum = 12,
    /// Checks whether the comparison attribute interpreted as a decimal number is less than or equal to the comparison value.
    LessEqNum = 13,
    /// Checks whether the comparison attribute interpreted as a decimal number is greater than the comparison value.
    GreaterNum = 14,
    /// Checks whether the comparison attribute interpreted as a decimal number is greater than or equal to the comparison value.
    GreaterEqNum = 15,
    /// Hashed variant of [`UserComparator::OneOf`].
    OneOfHashed = 16,
    /// Hashed variant of [`UserComparator::NotOneOf`].
    NotOneOfHashed = 17,
    /// Checks whether the comparison attribute interpreted as the seconds elapsed since Unix Epoch is less than the comparison value.
    BeforeDateTime = 18,
    /// Checks whether the comparison attribute interpreted as the seconds elapsed since Unix Epoch is greater than the comparison value.
    AfterDateTime = 19,
    /// Hashed variant of [`UserComparator::Eq`].
    EqHashed = 20,
    /// Hashed variant of [`UserComparator::NotEq`].
    NotEqHashed = 21,
    /// Hashed variant of [`UserComparator::StartsWithAnyOf`].
    StartsWithAnyOfHashed = 22,
    /// Hashed variant of [`UserComparator::NotStartsWithAnyOf`].
    NotStartsWithAnyOfHashed = 23,
    /// Hashed variant of [`UserComparator::EndsWithAnyOf`].
    EndsWithAnyOfHashed = 24,
    /// Hashed variant of [`UserComparator::NotEndsWithAnyOf`].
    NotEndsWithAnyOfHashed = 25,
    /// Hashed variant of [`UserComparator::ArrayContainsAnyOf`].
    ArrayContainsAnyOfHashed = 26,
    /// Hashed variant of [`UserComparator::ArrayNotContainsAnyOf`].
    ArrayNotContainsAnyOfHashed = 27,
    /// Checks whether the comparison attribute is equal to the comparison value.
    Eq = 28,
    /// Checks whether the comparison attribute is not equal to the comparison value.
    NotEq = 29,
    /// Checks whether the comparison attribute starts with any of the comparison values.
    StartsWithAnyOf = 30,
    /// Checks whether the comparison attribute does not start with any of the comparison values.
    NotStartsWithAnyOf = 31,
    /// Checks whether the comparison attribute ends with any of the comparison values.
    EndsWithAnyOf = 32,
    /// Checks whether the comparison attribute does not end with any of the comparison values.
    NotEndsWithAnyOf = 33,
    /// Checks whether the comparison attribute interpreted as a string list contains any of the comparison values.
    ArrayContainsAnyOf = 34,
    /// Checks whether the comparison attribute interpreted as a string list does not contain any of the comparison values.
    ArrayNotContainsAnyOf = 35,
}

impl Display for UserComparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use UserComparator::*;
        f.write_str(match self {
            OneOf | OneOfSemver | OneOfHashed => "IS ONE OF",
            NotOneOf | NotOneOfSemver | NotOneOfHashed => "IS NOT ONE OF",
            Contains => "CONTAINS ANY OF",
            NotContains => "NOT CONTAINS ANY OF",
            LessSemver | LessNum => "<",
            LessEqSemver | LessEqNum => "<=",
            GreaterSemver | GreaterNum => ">",
            GreaterEqSemver | GreaterEqNum => ">=",
            EqNum => "=",
            NotEqNum => "!=",
            BeforeDateTime => "BEFORE",
            AfterDateTime => "AFTER",
            Eq | EqHashed => "EQUALS",
            NotEq | NotEqHashed => "NOT EQUALS",
            StartsWithAnyOf | StartsWithAnyOfHashed => "STARTS WITH ANY OF",
            NotStartsWithAnyOf | NotStartsWithAnyOfHashed => "NOT STARTS WITH ANY OF",
            EndsWithAnyOf | EndsWithAnyOfHashed => "ENDS WITH ANY OF",
            NotEndsWithAnyOf | NotEndsWithAnyOfHashed => "NOT ENDS WITH ANY OF",
            ArrayContainsAnyOf | ArrayContainsAnyOfHashed => "ARRAY CONTAINS ANY OF",
            ArrayNotContainsAnyOf | ArrayNotContainsAnyOfHashed => "ARRAY NOT CONTAINS ANY OF",
        })
    }
}

impl UserComparator {
    pub(crate) fn is_sensitive(&self) -> bool {
        matches!(
            self,
            UserComparator::OneOfHashed
                | UserComparator::NotOneOfHashed
                | UserComparator::EqHashed
                | UserComparator::NotEqHashed
                | UserComparator::StartsWithAnyOfHashed
                | UserComparator::NotStartsWithAnyOfHashed
                | UserComparator::EndsWithAnyOfHashed
                | UserComparator::NotEndsWithAnyOfHashed
                | UserComparator::ArrayContainsAnyOfHashed
                | UserComparator::ArrayNotContainsAnyOfHashed
        )
    }

    pub(crate) fn is_date(&self) -> bool {
        matches!(
            self,
            UserComparator::AfterDateTime | UserComparator::BeforeDateTime
        )
    }

    pub(crate) fn is_starts_with(&self) -> bool {
        matches!(
            self,
            UserComparator::StartsWithAnyOf
                | UserComparator::StartsWithAnyOfHashed
                | UserComparator::NotStartsWithAnyOf
                | UserComparator::NotStartsWithAnyOfHashed
        )
    }

    /// `true` for the positive form of a comparator pair (e.g. `OneOf` vs `NotOneOf`).
    pub(crate) fn is_positive(&self) -> bool {
        use UserComparator::*;
        matches!(
            self,
            OneOf
                | Contains
                | OneOfSemver
                | OneOfHashed
                | EqHashed
                | StartsWithAnyOfHashed
                | EndsWithAnyOfHashed
                | ArrayContainsAnyOfHashed
                | Eq
                | StartsWithAnyOf
                | EndsWithAnyOf
                | ArrayContainsAnyOf
        )
    }
}
