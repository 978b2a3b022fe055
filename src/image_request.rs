use crate::area::GeoBoundingBox;
use crate::error::{Axis, Error, Result};
use crate::evalscript::{OutputEncoding, OutputStyle};
use crate::scene::SceneRecord;
use crate::utm;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_COLLECTION: &str = "sentinel-2-l2a";
pub const DEFAULT_RESOLUTION: f64 = 10.0;
pub const DEFAULT_MAX_DIMENSION: u32 = 2500;

const CRS84: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MosaickingOrder {
    #[default]
    #[serde(rename = "leastCC")]
    LeastCloudCover,
    #[serde(rename = "mostRecent")]
    MostRecent,
    #[serde(rename = "leastRecent")]
    LeastRecent,
}

/// Knobs of a Process API call that are not chosen per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Data collection id, Sentinel-2 L2A unless configured otherwise.
    pub data_collection: String,
    /// How overlapping scenes inside the time window are combined.
    pub mosaicking_order: MosaickingOrder,
    /// Upper bound for tile cloud coverage in percent, unset means no filter.
    pub max_cloud_coverage: Option<f64>,
    /// Ground resolution in metres per pixel.
    pub resolution: f64,
    /// Exclusive upper bound for either output dimension.
    pub max_dimension: u32,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            data_collection: DEFAULT_COLLECTION.to_string(),
            mosaicking_order: MosaickingOrder::default(),
            max_cloud_coverage: None,
            resolution: DEFAULT_RESOLUTION,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// A fully specified Process API call for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    bbox: GeoBoundingBox,
    time_from: String,
    time_to: String,
    style: OutputStyle,
    evalscript: String,
    bands: u8,
    width: u32,
    height: u32,
    encoding: OutputEncoding,
    data_collection: String,
    mosaicking_order: MosaickingOrder,
    max_cloud_coverage: Option<f64>,
}

impl ImageRequest {
    pub fn bbox(&self) -> &GeoBoundingBox {
        &self.bbox
    }

    pub fn time_range(&self) -> (&str, &str) {
        (&self.time_from, &self.time_to)
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn evalscript(&self) -> &str {
        &self.evalscript
    }

    pub fn bands(&self) -> u8 {
        self.bands
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    /// Process API request body.
    pub fn payload(&self) -> Value {
        let mut data_filter = json!({
            "timeRange": {"from": self.time_from, "to": self.time_to},
            "mosaickingOrder": self.mosaicking_order,
        });
        if let Some(max_cc) = self.max_cloud_coverage {
            data_filter["maxCloudCoverage"] = json!(max_cc);
        }

        json!({
            "input": {
                "bounds": {
                    "bbox": self.bbox.as_array(),
                    "properties": {"crs": CRS84},
                },
                "data": [{
                    "type": self.data_collection,
                    "dataFilter": data_filter,
                }],
            },
            "output": {
                "width": self.width,
                "height": self.height,
                "responses": [{
                    "identifier": "default",
                    "format": {"type": self.encoding.mime_type()},
                }],
            },
            "evalscript": self.evalscript,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    options: ProcessOptions,
}

impl RequestBuilder {
    pub fn new(options: ProcessOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Output size of `bbox`, rejected when either side reaches the limit or
    /// rounds to zero pixels.
    pub fn dimensions(&self, bbox: &GeoBoundingBox) -> Result<(u32, u32)> {
        let resolution = self.options.resolution;
        let limit = self.options.max_dimension;
        let Some((width, height)) = utm::bbox_to_dimensions(bbox, resolution) else {
            let pixels = utm::approximate_width(bbox, resolution).max(limit);
            debug!(pixels, limit, "area outside a single UTM zone's reach");
            return Err(Error::InvalidDimensions {
                axis: Axis::Width,
                pixels,
                limit,
            });
        };
        debug!(width, height, limit, "computed output size");

        for (axis, pixels) in [(Axis::Width, width), (Axis::Height, height)] {
            if pixels >= limit {
                return Err(Error::InvalidDimensions {
                    axis,
                    pixels,
                    limit,
                });
            }
        }
        if width == 0 || height == 0 {
            return Err(Error::Validation(format!(
                "Area of interest is smaller than one pixel at {resolution} m ({width}x{height} px)"
            )));
        }
        Ok((width, height))
    }

    /// The time window is pinned to the scene's acquisition time so the
    /// service renders exactly that scene.
    pub fn build(
        &self,
        bbox: &GeoBoundingBox,
        scene: &SceneRecord,
        style: OutputStyle,
        encoding: OutputEncoding,
    ) -> Result<ImageRequest> {
        let (width, height) = self.dimensions(bbox)?;
        let script = style.evalscript();

        Ok(ImageRequest {
            bbox: *bbox,
            time_from: scene.datetime.clone(),
            time_to: scene.datetime.clone(),
            style,
            evalscript: script.source.to_string(),
            bands: script.bands,
            width,
            height,
            encoding,
            data_collection: self.options.data_collection.clone(),
            mosaicking_order: self.options.mosaicking_order,
            max_cloud_coverage: self.options.max_cloud_coverage,
        })
    }
}

pub fn build_request(
    bbox: &GeoBoundingBox,
    scene: &SceneRecord,
    style: OutputStyle,
    encoding: OutputEncoding,
) -> Result<ImageRequest> {
    RequestBuilder::default().build(bbox, scene, style, encoding)
}
