//! Seams to the remote catalog and rendering services, plus the catalog
//! search wire types.
use crate::area::{GeoBoundingBox, TimeInterval};
use crate::error::Result;
use crate::image_request::ImageRequest;
use crate::scene::SceneRecord;
use serde::{Deserialize, Serialize};

pub const INCLUDE_FIELDS: [&str; 4] = [
    "id",
    "properties.datetime",
    "properties.eo:cloud_cover",
    "bbox",
];
pub const EXCLUDE_FIELDS: [&str; 3] = ["stac_version", "stac_extensions", "links"];

pub trait Catalog {
    /// Every scene of the configured collection intersecting `bbox` within
    /// `interval`, in whatever order the service returns them.
    async fn search(
        &self,
        bbox: &GeoBoundingBox,
        interval: &TimeInterval,
    ) -> Result<Vec<SceneRecord>>;
}

pub trait ImageService {
    /// Raw image bytes in the request's encoding.
    async fn fetch(&self, request: &ImageRequest) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSearch {
    pub collections: Vec<String>,
    pub bbox: [f64; 4],
    pub datetime: String,
    pub limit: u32,
    pub fields: FieldFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFilter {
    pub include: Vec<&'static str>,
    pub exclude: Vec<&'static str>,
}

impl Default for FieldFilter {
    fn default() -> Self {
        Self {
            include: INCLUDE_FIELDS.to_vec(),
            exclude: EXCLUDE_FIELDS.to_vec(),
        }
    }
}

impl CatalogSearch {
    pub fn new(
        collection: &str,
        bbox: &GeoBoundingBox,
        interval: &TimeInterval,
        limit: u32,
    ) -> Self {
        Self {
            collections: vec![collection.to_string()],
            bbox: bbox.as_array(),
            datetime: interval.to_rfc3339_range(),
            limit,
            fields: FieldFilter::default(),
            next: None,
        }
    }

    pub fn with_next(&self, next: u64) -> Self {
        Self {
            next: Some(next),
            ..self.clone()
        }
    }
}

/// One page of a catalog search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub features: Vec<SceneRecord>,
    #[serde(default)]
    pub context: SearchContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchContext {
    pub next: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body() {
        let bbox = GeoBoundingBox::new(16.46, 46.75, 16.57, 46.85).unwrap();
        let toi = TimeInterval::new("2024-05-01", "2024-05-20").unwrap();
        let search = CatalogSearch::new("sentinel-2-l2a", &bbox, &toi, 100);
        let body = serde_json::to_value(&search).unwrap();

        assert_eq!(body["collections"], serde_json::json!(["sentinel-2-l2a"]));
        assert_eq!(body["bbox"], serde_json::json!([16.46, 46.75, 16.57, 46.85]));
        assert_eq!(body["datetime"], "2024-05-01T00:00:00Z/2024-05-20T23:59:59Z");
        assert_eq!(body["limit"], 100);
        assert_eq!(
            body["fields"]["include"],
            serde_json::json!(["id", "properties.datetime", "properties.eo:cloud_cover", "bbox"])
        );
        assert_eq!(
            body["fields"]["exclude"],
            serde_json::json!(["stac_version", "stac_extensions", "links"])
        );
        assert!(body.get("next").is_none());
        assert_eq!(serde_json::to_value(search.with_next(5)).unwrap()["next"], 5);
    }

    #[test]
    fn test_parse_page() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "id": "S2A_MSIL2A_20240504T100021_N0510_R122_T33TWM_20240504T140213",
                "bbox": [15.0, 46.0, 16.4, 47.0],
                "properties": {"datetime": "2024-05-04T10:07:48Z", "eo:cloud_cover": 12.5}
            }],
            "context": {"next": 1, "limit": 1, "returned": 1}
        }"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.features.len(), 1);
        assert_eq!(page.features[0].cloud_cover, 12.5);
        assert_eq!(page.context.next, Some(1));
    }

    #[test]
    fn test_parse_last_page() {
        let json = r#"{"type": "FeatureCollection", "features": [], "context": {"limit": 100, "returned": 0}}"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert!(page.features.is_empty());
        assert_eq!(page.context.next, None);
    }
}
