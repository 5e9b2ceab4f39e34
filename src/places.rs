// Place search collaborator types
// The search proxy itself lives outside this crate; only its record shape and
// the keyword-selection helpers are defined here.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One place hit from the local search proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub title: String,
    pub link: String,
    pub category: String,
    pub description: String,
    pub telephone: String,
    pub address: String,
    pub road_address: String,
    pub mapx: String,
    pub mapy: String,
}

/// Response shape of `GET /search?query=...`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PlaceRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A coordinate from the geolocation provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>?").unwrap());

/// Search results come back with markup in titles; strip it for display.
pub fn strip_html(html: &str) -> String {
    HTML_TAG_RE.replace_all(html, "").to_string()
}

/// Search keywords tuned to the child's age and the weather.
pub fn search_keywords(months: u32, good_for_outdoor: bool) -> Vec<String> {
    let setting = if good_for_outdoor { "outdoor" } else { "indoor" };

    let bases: &[&str] = if months < 12 {
        &[
            "stroller walk",
            "baby-friendly cafe",
            "baby cafe",
            "nursing room park",
        ]
    } else if months < 36 {
        &[
            "children's park",
            "kids cafe",
            "play center",
            "petting farm",
            "toddler activity",
        ]
    } else {
        &[
            "children's museum",
            "large kids cafe",
            "children's experience center",
            "theme park",
            "forest experience",
        ]
    };

    bases
        .iter()
        .map(|base| format!("{} {}", setting, base))
        .collect()
}
