use crate::model::config::Setting;
use crate::r#override::OverrideDataSource;
use crate::value::Value;
use std::collections::HashMap;

/// Data source that serves overrides from an in-memory map of [`Value`]s.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use configcat_core::{MapDataSource, Value};
///
/// let from_array = MapDataSource::from([("flag", Value::Bool(true))]);
/// let from_map: MapDataSource = HashMap::from([("text".to_owned(), Value::from("abc"))]).into();
/// ```
pub struct MapDataSource {
    overrides: HashMap<String, Setting>,
}

impl OverrideDataSource for MapDataSource {
    fn settings(&self) -> &HashMap<String, Setting> {
        &self.overrides
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MapDataSource {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            overrides: iter
                .into_iter()
                .map(|(key, value)| (key.into(), Setting::from(&value)))
                .collect(),
        }
    }
}

impl<K: Into<String>> From<HashMap<K, Value>> for MapDataSource {
    fn from(map: HashMap<K, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Value); N]> for MapDataSource {
    fn from(arr: [(K, Value); N]) -> Self {
        arr.into_iter().collect()
    }
}
