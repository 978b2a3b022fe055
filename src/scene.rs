use crate::area::{GeoBoundingBox, TimeInterval};
use crate::catalog::Catalog;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// One catalog search hit, reduced to the fields the search asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SceneFeature", into = "SceneFeature")]
pub struct SceneRecord {
    pub id: String,
    pub datetime: String,
    pub cloud_cover: f64,
    pub bbox: [f64; 4],
}

impl SceneRecord {
    pub fn cmp_cloud_cover(&self, other: &Self) -> Ordering {
        self.cloud_cover.total_cmp(&other.cloud_cover)
    }
}

// Wire shape of a field-filtered STAC feature
#[derive(Clone, Serialize, Deserialize)]
struct SceneFeature {
    id: String,
    bbox: [f64; 4],
    properties: SceneProperties,
}

#[derive(Clone, Serialize, Deserialize)]
struct SceneProperties {
    datetime: String,
    #[serde(rename = "eo:cloud_cover")]
    cloud_cover: f64,
}

impl From<SceneFeature> for SceneRecord {
    fn from(feature: SceneFeature) -> Self {
        Self {
            id: feature.id,
            datetime: feature.properties.datetime,
            cloud_cover: feature.properties.cloud_cover,
            bbox: feature.bbox,
        }
    }
}

impl From<SceneRecord> for SceneFeature {
    fn from(record: SceneRecord) -> Self {
        Self {
            id: record.id,
            bbox: record.bbox,
            properties: SceneProperties {
                datetime: record.datetime,
                cloud_cover: record.cloud_cover,
            },
        }
    }
}

/// Picks the scene with the least cloud cover. On ties the earliest one in
/// `scenes` wins.
pub fn select_best_scene<I>(scenes: I) -> Option<SceneRecord>
where
    I: IntoIterator<Item = SceneRecord>,
{
    scenes
        .into_iter()
        .fold(None, |best: Option<SceneRecord>, scene| match best {
            Some(current) if scene.cmp_cloud_cover(&current) != Ordering::Less => Some(current),
            _ => Some(scene),
        })
}

/// Searches `catalog` and returns the least cloudy scene, `None` when the
/// search has no hits.
pub async fn find_best_scene(
    catalog: &impl Catalog,
    bbox: &GeoBoundingBox,
    interval: &TimeInterval,
) -> Result<Option<SceneRecord>> {
    let scenes = catalog.search(bbox, interval).await?;
    debug!(candidates = scenes.len(), "catalog search complete");

    let best = select_best_scene(scenes);
    if let Some(scene) = &best {
        info!(id = %scene.id, cloud_cover = scene.cloud_cover, "selected scene");
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(n: u32, cloud_cover: f64) -> SceneRecord {
        SceneRecord {
            id: format!("S2B_MSIL2A_{n}"),
            datetime: format!("2022-05-2{n}T10:07:48Z"),
            cloud_cover,
            bbox: [14.0, 45.0, 16.0, 47.0],
        }
    }

    fn mock_results() -> Vec<SceneRecord> {
        let json = r#"[
            {
                "id": "S2B_MSIL2A_1",
                "bbox": [14.0, 45.0, 16.0, 47.0],
                "properties": {"datetime": "2022-05-20T10:07:48Z", "eo:cloud_cover": 7.00}
            },
            {
                "id": "S2B_MSIL2A_2",
                "bbox": [14.0, 45.0, 16.0, 47.0],
                "properties": {"datetime": "2022-05-21T10:07:48Z", "eo:cloud_cover": 12.00}
            },
            {
                "id": "S2B_MSIL2A_3",
                "bbox": [14.0, 45.0, 16.0, 47.0],
                "properties": {"datetime": "2022-05-22T10:07:48Z", "eo:cloud_cover": 0.30}
            }
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deserialize_feature() {
        let results = mock_results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "S2B_MSIL2A_1");
        assert_eq!(results[0].datetime, "2022-05-20T10:07:48Z");
        assert_eq!(results[0].cloud_cover, 7.0);
        assert_eq!(results[0].bbox, [14.0, 45.0, 16.0, 47.0]);
    }

    #[test]
    fn test_select_least_cloudy() {
        let results = mock_results();
        let best = select_best_scene(results.clone()).unwrap();
        assert_eq!(best, results[2]);
    }

    #[test]
    fn test_select_distinct_values() {
        let scenes = vec![scene(1, 55.0), scene(2, 3.5), scene(3, 80.0), scene(4, 3.6)];
        assert_eq!(select_best_scene(scenes).unwrap().id, "S2B_MSIL2A_2");
    }

    #[test]
    fn test_select_first_of_ties() {
        let scenes = vec![scene(1, 9.0), scene(2, 1.0), scene(3, 1.0), scene(4, 1.0)];
        assert_eq!(select_best_scene(scenes).unwrap().id, "S2B_MSIL2A_2");
    }

    #[test]
    fn test_select_empty() {
        assert_eq!(select_best_scene(Vec::new()), None);
    }

    #[test]
    fn test_cmp_is_symmetric() {
        let a = scene(1, 2.0);
        let b = scene(2, 4.0);
        let c = scene(3, 2.0);
        assert_eq!(a.cmp_cloud_cover(&b), Ordering::Less);
        assert_eq!(b.cmp_cloud_cover(&a), Ordering::Greater);
        assert_eq!(a.cmp_cloud_cover(&c), Ordering::Equal);
        assert_eq!(c.cmp_cloud_cover(&a), Ordering::Equal);
    }

    #[test]
    fn test_nan_never_wins() {
        let scenes = vec![scene(1, f64::NAN), scene(2, 99.0)];
        assert_eq!(select_best_scene(scenes).unwrap().id, "S2B_MSIL2A_2");
    }
}
