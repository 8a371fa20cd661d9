use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::shared::AppError;

/// Image file types accepted for ad pictures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Png,
    Webp,
}

impl ImageExtension {
    /// Reads the extension after the last `.` of the final path segment of
    /// `filename`, taken verbatim. A missing or empty extension counts as `jpg`.
    pub fn from_filename(filename: Option<&str>) -> Result<Self, AppError> {
        let raw = filename
            .map(|name| name.rsplit_once('/').map_or(name, |(_, last)| last))
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or("jpg");

        ImageExtension::from_str(raw).map_err(|_| AppError::BadRequest(Self::allowed_message()))
    }

    fn allowed_message() -> String {
        let allowed: Vec<String> = ImageExtension::iter().map(|ext| ext.to_string()).collect();
        format!("Only {} allowed", allowed.join(", "))
    }
}
