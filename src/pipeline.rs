use crate::area::{GeoBoundingBox, TimeInterval};
use crate::catalog::{Catalog, ImageService};
use crate::download::{self, DownloadPlan};
use crate::error::Result;
use crate::evalscript::{OutputEncoding, OutputStyle};
use crate::image_request::RequestBuilder;
use crate::scene;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOrder {
    pub bbox: GeoBoundingBox,
    pub interval: TimeInterval,
    pub style: OutputStyle,
    pub encoding: OutputEncoding,
}

impl ImageOrder {
    /// Parses raw user input. Style and format are checked before the area
    /// and time so an unknown style is reported first.
    pub fn parse(aoi: &str, toi: &str, style: &str, format: &str) -> Result<Self> {
        let style: OutputStyle = style.parse()?;
        let encoding: OutputEncoding = format.parse()?;
        Ok(Self {
            bbox: aoi.parse()?,
            interval: toi.parse()?,
            style,
            encoding,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub plan: DownloadPlan,
    /// False when the output file was already present and nothing was fetched.
    pub fetched: bool,
}

impl Download {
    pub fn path(&self) -> &Path {
        &self.plan.output
    }
}

/// Finds the least cloudy scene for `order` and saves it under `output_dir`.
///
/// Returns `Ok(None)` when the catalog has no scene for the area and time.
pub async fn request_image<C, S>(
    catalog: &C,
    images: &S,
    builder: &RequestBuilder,
    output_dir: &Path,
    order: &ImageOrder,
) -> Result<Option<Download>>
where
    C: Catalog,
    S: ImageService,
{
    // Fails before any network call when the area is too large
    builder.dimensions(&order.bbox)?;

    let Some(best) = scene::find_best_scene(catalog, &order.bbox, &order.interval).await? else {
        info!("no scene found");
        return Ok(None);
    };

    let request = builder.build(&order.bbox, &best, order.style, order.encoding)?;
    let output = download::output_path(output_dir, &best, &order.bbox, order.style, order.encoding);
    let plan = DownloadPlan::new(best, request, output);

    if plan.output.exists() {
        info!(path = %plan.output.display(), "output file already exists");
        return Ok(Some(Download {
            plan,
            fetched: false,
        }));
    }

    let bytes = images.fetch(&plan.request).await?;
    download::save_image(&bytes, &plan.output)?;
    debug!(path = %plan.output.display(), "download complete");

    Ok(Some(Download {
        plan,
        fetched: true,
    }))
}

/// Path of the JSON plan written next to an image.
pub fn plan_path(image: &Path) -> PathBuf {
    image.with_extension("json")
}
