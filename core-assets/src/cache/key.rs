//! Cache keys and the key-to-file-name mapping.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything but `[A-Za-z0-9_-]`. `.` and `%` included.
const FILE_NAME_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Identifies one cacheable asset.
///
/// `value` is the stable identifier; `file_extension` is a hint used when the
/// cached representation is a file (so `usdz` files keep their extension).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    value: String,
    file_extension: Option<String>,
}

impl CacheKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            file_extension: None,
        }
    }

    /// A leading dot is ignored, so `"usdz"` and `".usdz"` are the same key.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let trimmed = extension.trim_start_matches('.');
        self.file_extension = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn file_extension(&self) -> Option<&str> {
        self.file_extension.as_deref()
    }

    /// File name of this key inside a cache directory.
    ///
    /// A pure function of `value` and `file_extension`. Bytes outside
    /// `[A-Za-z0-9_-]` are percent-encoded, and so is `.` in the value, which
    /// keeps the mapping injective and stops keys from escaping the directory
    /// or colliding with an extension boundary.
    pub fn file_name(&self) -> String {
        let mut name = encode_component(&self.value);
        if let Some(extension) = &self.file_extension {
            name.push('.');
            name.push_str(&encode_component(extension));
        }
        name
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file_extension {
            Some(extension) => write!(f, "{}.{}", self.value, extension),
            None => f.write_str(&self.value),
        }
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, FILE_NAME_ESCAPES).to_string()
}
