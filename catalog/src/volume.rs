use serde::{Deserialize, Serialize};

/// A single volume record as the upstream catalog returns it.
///
/// Search responses sometimes contain entries without a metadata block;
/// `volume_info` stays optional so those entries survive decoding and can
/// be filtered during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub image_links: Option<ImageLinks>,
    pub industry_identifiers: Option<Vec<IndustryIdentifier>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

/// Paged search response from the upstream catalog.
///
/// `total_items` is the upstream's advisory total for the whole query,
/// not the length of `items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    pub items: Vec<Volume>,
    pub total_items: i64,
}

impl SearchResponse {
    /// The degraded value every failed search collapses to.
    pub fn empty() -> Self {
        Self::default()
    }
}
