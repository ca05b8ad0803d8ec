//! Known assets and where to fetch them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::{ParseError, Url};

use crate::cache::CacheKey;
use crate::error::AssetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Warship,
}

impl Asset {
    pub const ALL: [Asset; 1] = [Asset::Warship];

    /// Short name, matching the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Asset::Warship => "warship",
        }
    }

    /// Stable identifier at the origin.
    pub fn identifier(&self) -> &'static str {
        match self {
            Asset::Warship => "KM1PUvbAai5kXm8",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Asset::Warship => "usdz",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Asset::Warship => "USS Gato (SS-212)",
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.identifier()).with_extension(self.file_extension())
    }

    pub fn locator(&self, base_url: &Url) -> Result<Url, ParseError> {
        resource_locator(base_url, self.identifier())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Accepts either the origin identifier or the snake_case name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::ALL
            .into_iter()
            .find(|asset| {
                asset.identifier() == s || asset.name().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| AssetError::UnknownAsset(s.to_string()))
    }
}

/// `{base}/{identifier}/download`. A trailing slash on `base` is dropped and
/// `identifier` is percent-encoded as a single path segment.
pub fn resource_locator(base_url: &Url, identifier: &str) -> Result<Url, ParseError> {
    let mut locator = base_url.clone();
    {
        let mut segments = locator
            .path_segments_mut()
            .map_err(|_| ParseError::RelativeUrlWithCannotBeABaseBase)?;
        segments.pop_if_empty().push(identifier).push("download");
    }
    Ok(locator)
}
