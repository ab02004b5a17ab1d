use crate::model::config::{config_from_json, Setting};
use crate::r#override::OverrideDataSource;
use crate::value::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

/// Describes overrides in a simple JSON map format:
///
/// ```json
/// {
///   "flags": {
///     "bool_flag": true,
///     "string_setting": "example",
///     "number_setting": 3.14
///   }
/// }
/// ```
#[derive(Deserialize)]
pub struct SimplifiedConfig {
    /// The feature flag override JSON map.
    pub flags: HashMap<String, serde_json::Value>,
}

/// Failure of loading a [`FileDataSource`].
#[derive(Error, Debug)]
pub enum OverrideFileError {
    /// The file could not be read.
    #[error("Failed to read the override file '{path}'. ({source})")]
    Read {
        /// Path of the file.
        path: String,
        /// The I/O error.
        source: std::io::Error,
    },
    /// An entry of the simplified format holds a value that is not a bool, number or string.
    #[error("Value of override '{0}' is invalid.")]
    InvalidValue(String),
    /// The content is neither the simplified format nor a config JSON.
    #[error("Failed to parse the override file. ({0})")]
    Parse(String),
}

/// Data source that reads the overrides from a JSON file.
///
/// Both the [`SimplifiedConfig`] format and the full config JSON format are supported.
///
/// # Examples
///
/// ```no_run
/// use configcat_core::FileDataSource;
///
/// let source = FileDataSource::new("path/to/file.json").unwrap();
/// ```
pub struct FileDataSource {
    settings: HashMap<String, Setting>,
}

impl FileDataSource {
    /// Loads the overrides from the given file.
    ///
    /// # Errors
    ///
    /// Fails when the file can't be read or its content is neither a [`SimplifiedConfig`] nor a config JSON.
    pub fn new(file_path: &str) -> Result<Self, OverrideFileError> {
        let content = fs::read_to_string(file_path).map_err(|source| OverrideFileError::Read {
            path: file_path.to_owned(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses the overrides from an in-memory JSON document.
    pub fn from_json(content: &str) -> Result<Self, OverrideFileError> {
        if let Ok(simple) = serde_json::from_str::<SimplifiedConfig>(content) {
            let settings = simple
                .flags
                .iter()
                .map(|(key, json_val)| match Value::from_json_val(json_val) {
                    Some(val) => Ok((key.clone(), Setting::from(&val))),
                    None => Err(OverrideFileError::InvalidValue(key.clone())),
                })
                .collect::<Result<HashMap<String, Setting>, OverrideFileError>>()?;
            return Ok(Self { settings });
        }
        let config =
            config_from_json(content).map_err(|err| OverrideFileError::Parse(err.to_string()))?;
        Ok(Self {
            settings: config.settings,
        })
    }
}

impl OverrideDataSource for FileDataSource {
    fn settings(&self) -> &HashMap<String, Setting> {
        &self.settings
    }
}
