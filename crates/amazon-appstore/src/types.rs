//! Resource payloads exchanged with the submission API
//!
//! These are thin pass-through types: the fields callers commonly read are
//! typed, and everything else is kept in `extra` so it round-trips unchanged
//! when a fetched resource is sent back as an update.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// An in-progress draft of an app's next release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    /// Edit identifier
    pub id: String,

    /// Edit status (e.g. `IN_PROGRESS`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An APK attached to an edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apk {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Localized store listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_changes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_bullets: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the all-languages listings endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListingsResponse {
    #[serde(default)]
    pub listings: BTreeMap<String, Listing>,
}

/// App-level details (default language, contact info)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Publishing availability window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publishing_date: Option<PublishingDate>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingDate {
    pub date_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

/// Device targeting of one APK
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Targeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amazon_devices: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_amazon_devices: Option<Vec<Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ImagesResponse {
    #[serde(default)]
    pub images: Vec<ImageAsset>,
}

/// An uploaded video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    pub id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VideosResponse {
    #[serde(default)]
    pub videos: Vec<VideoAsset>,
}

/// Result of a staged large-file upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeUpload {
    pub file_id: String,
}

/// Listing image slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageType {
    SmallIcons,
    LargeIcons,
    Screenshots,
    PromoImages,
    FiretvScreenshots,
    FiretvIcons,
    FiretvBackgrounds,
    FiretvFeaturedBackgrounds,
    FiretvFeaturedLogos,
}

impl ImageType {
    /// Every image type, in path-segment order of the API documentation
    pub const ALL: [ImageType; 9] = [
        ImageType::SmallIcons,
        ImageType::LargeIcons,
        ImageType::Screenshots,
        ImageType::PromoImages,
        ImageType::FiretvScreenshots,
        ImageType::FiretvIcons,
        ImageType::FiretvBackgrounds,
        ImageType::FiretvFeaturedBackgrounds,
        ImageType::FiretvFeaturedLogos,
    ];

    /// Path segment used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::SmallIcons => "small-icons",
            ImageType::LargeIcons => "large-icons",
            ImageType::Screenshots => "screenshots",
            ImageType::PromoImages => "promo-images",
            ImageType::FiretvScreenshots => "firetv-screenshots",
            ImageType::FiretvIcons => "firetv-icons",
            ImageType::FiretvBackgrounds => "firetv-backgrounds",
            ImageType::FiretvFeaturedBackgrounds => "firetv-featured-backgrounds",
            ImageType::FiretvFeaturedLogos => "firetv-featured-logos",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown image type: {}", s))
    }
}
