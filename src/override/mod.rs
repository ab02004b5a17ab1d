use crate::model::config::Setting;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

pub mod behavior;
pub mod file;
pub mod map;

pub use behavior::OverrideBehavior;

/// Data source that provides feature flag and setting value overrides.
pub trait OverrideDataSource: Sync + Send {
    /// Gets the overridden feature flags and settings.
    fn settings(&self) -> &HashMap<String, Setting>;
}

pub(crate) trait OptionalOverrides {
    fn is_local(&self) -> bool;
}

pub(crate) struct FlagOverrides {
    behavior: OverrideBehavior,
    source: Box<dyn OverrideDataSource>,
}

impl FlagOverrides {
    pub(crate) fn new(source: Box<dyn OverrideDataSource>, behavior: OverrideBehavior) -> Self {
        Self { behavior, source }
    }

    /// Combines the downloaded settings with the local ones according to the configured behavior.
    pub(crate) fn apply<'a>(
        &'a self,
        remote: Option<&'a HashMap<String, Setting>>,
    ) -> Cow<'a, HashMap<String, Setting>> {
        let local = self.source.settings();
        match (self.behavior, remote) {
            (OverrideBehavior::LocalOnly, _) | (_, None) => Cow::Borrowed(local),
            (OverrideBehavior::LocalOverRemote, Some(remote)) => {
                let mut merged = remote.clone();
                merged.extend(local.iter().map(|(k, v)| (k.clone(), v.clone())));
                Cow::Owned(merged)
            }
            (OverrideBehavior::RemoteOverLocal, Some(remote)) => {
                let mut merged = local.clone();
                merged.extend(remote.iter().map(|(k, v)| (k.clone(), v.clone())));
                Cow::Owned(merged)
            }
        }
    }
}

impl OptionalOverrides for Option<FlagOverrides> {
    fn is_local(&self) -> bool {
        self.as_ref()
            .is_some_and(|ov| ov.behavior == OverrideBehavior::LocalOnly)
    }
}

impl Debug for FlagOverrides {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagOverrides")
            .field("behavior", &self.behavior)
            .finish_non_exhaustive()
    }
}
