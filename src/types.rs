use crate::client::DEFAULT_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How hard Imagify should squeeze the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Lossless-ish compression, pixels untouched.
    Normal,
    #[default]
    Aggressive,
    /// Strongest compression, visible quality loss possible.
    Ultra,
}

/// Resize directives applied by the API before optimizing. Unset fields are
/// left out of the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resize {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u32>,
}

/// Settings for [`upload_image`](crate::Client::upload_image) and
/// [`fetch_image`](crate::Client::fetch_image).
///
/// ```
/// use imagify_api::{Level, OptimizeOptions, Resize};
///
/// let options = OptimizeOptions {
///     level: Level::Ultra,
///     resize: Some(Resize { width: Some(1920), ..Default::default() }),
///     ..Default::default()
/// };
/// # let _ = options;
/// ```
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    pub level: Level,
    pub resize: Option<Resize>,
    /// Keep EXIF metadata in the optimized output. Stripped by default.
    pub keep_exif: bool,
    /// Deadline for the upload request; large originals take a while.
    pub timeout: Duration,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            level: Level::default(),
            resize: None,
            keep_exif: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OptimizeOptions {
    /// The exact JSON shape the API expects. The level collapses into two
    /// booleans; a missing resize becomes an empty object.
    pub(crate) fn payload(&self) -> OptimizePayload<'_> {
        OptimizePayload {
            aggressive: self.level == Level::Aggressive,
            ultra: self.level == Level::Ultra,
            resize: self.resize.clone().unwrap_or_default(),
            keep_exif: self.keep_exif,
            url: None,
        }
    }
}

/// Wire encoding shared by the upload `data` part and the fetch body; `url`
/// is only present for fetch-by-URL requests.
#[derive(Debug, Serialize)]
pub(crate) struct OptimizePayload<'a> {
    pub aggressive: bool,
    pub ultra: bool,
    pub resize: Resize,
    pub keep_exif: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
}
