//! Feature flag evaluation core: config JSON download and caching, polling strategies,
//! local overrides, and the targeting rule evaluator of the ConfigCat config_v6 format.

#![warn(missing_docs)]

#[macro_use]
mod macros;
mod builder;
mod cache;
mod client;
mod constants;
mod errors;
mod eval;
mod fetch;
mod hooks;
mod model;
mod modes;
mod options;
mod r#override;
mod registry;
mod user;
mod utils;
mod value;

pub use builder::ClientBuilder;
pub use cache::{AsyncConfigCache, ConfigCache};
pub use client::Client;
pub use constants::PKG_VERSION;
pub use errors::{
    ClientError, ErrorCause, ErrorKind, EvaluationError, EvaluationErrorCode, RefreshErrorCode,
    RefreshResult,
};
pub use eval::details::{EvaluationDetails, EvaluationResult};
pub use eval::evaluator::evaluate;
pub use fetch::transport::{ConfigFetcher, FetchError, FetchRequest, FetchResponse};
pub use hooks::Hooks;
pub use registry::ClientRegistry;

pub use model::config::{
    Condition, Config, PercentageOption, PrerequisiteFlagCondition, Segment,
    SegmentCondition, ServedValue, Setting, SettingValue, TargetingRule, UserCondition,
};
pub use model::entry::{ConfigEntry, EntryError};

pub use model::enums::{
    ClientCacheState, DataGovernance, PrerequisiteFlagComparator, RedirectMode, SegmentComparator,
    SettingType, UserComparator,
};

pub use r#override::{
    file::FileDataSource, file::OverrideFileError, file::SimplifiedConfig, map::MapDataSource,
    OverrideBehavior, OverrideDataSource,
};

pub use modes::PollingMode;

pub use user::{User, UserValue};
pub use value::{Value, ValuePrimitive};
