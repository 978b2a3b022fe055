use crate::area::GeoBoundingBox;
use crate::error::Result;
use crate::evalscript::{OutputEncoding, OutputStyle};
use crate::image_request::ImageRequest;
use crate::scene::SceneRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything needed to reproduce one download: the chosen scene, the
/// request sent for it and where the image lands.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DownloadPlan {
    pub scene: SceneRecord,
    pub request: ImageRequest,
    pub output: PathBuf,
}

impl DownloadPlan {
    pub fn new(scene: SceneRecord, request: ImageRequest, output: PathBuf) -> Self {
        Self {
            scene,
            request,
            output,
        }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let plan: Self = serde_json::from_str(&content)?;
        Ok(plan)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// `<dir>/<scene time>_<w>_<s>_<e>_<n>_<style>.<ext>` with anything outside
/// `[A-Za-z0-9._-]` replaced by `-`.
pub fn output_path(
    dir: &Path,
    scene: &SceneRecord,
    bbox: &GeoBoundingBox,
    style: OutputStyle,
    encoding: OutputEncoding,
) -> PathBuf {
    let name = format!(
        "{}_{}_{}_{}_{}_{}",
        scene.datetime, bbox.west, bbox.south, bbox.east, bbox.north, style
    );
    let re = Regex::new(r"[^A-Za-z0-9._-]").expect("Regex pattern should always compile");
    let name = re.replace_all(&name, "-");
    dir.join(format!("{}.{}", name, encoding.extension()))
}

/// Writes `bytes` to `output` through a `.partial` sibling, so `output` only
/// ever exists complete.
pub fn save_image(bytes: &[u8], output: &Path) -> Result<()> {
    if let Some(parent_dir) = output.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }

    let partial = partial_path(output);
    let mut partial_file = File::create(&partial)?;
    if let Err(e) = partial_file.write_all(bytes).and_then(|_| partial_file.sync_all()) {
        let _ = fs::remove_file(&partial);
        return Err(e.into());
    }

    fs::rename(&partial, output)?;
    debug!(path = %output.display(), size = bytes.len(), "image written");
    Ok(())
}

fn partial_path(output: &Path) -> PathBuf {
    let mut partial = output.as_os_str().to_owned();
    partial.push(".partial");
    PathBuf::from(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_request::build_request;

    fn scene() -> SceneRecord {
        SceneRecord {
            id: "S2B_MSIL2A_3".to_string(),
            datetime: "2022-05-22T10:07:48Z".to_string(),
            cloud_cover: 0.3,
            bbox: [14.0, 45.0, 16.0, 47.0],
        }
    }

    fn bbox() -> GeoBoundingBox {
        GeoBoundingBox::new(16.461282, 46.757161, 16.574922, 46.851514).unwrap()
    }

    #[test]
    fn test_output_path() {
        let path = output_path(
            Path::new("data"),
            &scene(),
            &bbox(),
            OutputStyle::VegetationIndex,
            OutputEncoding::Png,
        );
        assert_eq!(
            path,
            PathBuf::from("data/2022-05-22T10-07-48Z_16.461282_46.757161_16.574922_46.851514_ndvi.png")
        );
    }

    #[test]
    fn test_output_path_negative_coords() {
        let area = GeoBoundingBox::new(-58.5, -34.7, -58.3, -34.5).unwrap();
        let path = output_path(
            Path::new("out"),
            &scene(),
            &area,
            OutputStyle::TrueColor,
            OutputEncoding::Tiff,
        );
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "2022-05-22T10-07-48Z_-58.5_-34.7_-58.3_-34.5_visual.tiff");
    }

    #[test]
    fn test_save_image() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("image.png");
        save_image(b"\x89PNG fake", &output).unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"\x89PNG fake");
        assert!(!partial_path(&output).exists());
    }

    #[test]
    fn test_write_read_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download_plan.json");
        let request = build_request(
            &bbox(),
            &scene(),
            OutputStyle::TrueColor,
            OutputEncoding::Png,
        )
        .unwrap();
        let plan = DownloadPlan::new(scene(), request, PathBuf::from("data/image.png"));
        plan.write(&path).unwrap();

        let read = DownloadPlan::read(&path).unwrap();
        assert_eq!(read.scene.id, plan.scene.id);
        assert_eq!(read.output, plan.output);
        assert_eq!(read.request.time_range(), plan.request.time_range());
        assert_eq!(read.request.dimensions(), plan.request.dimensions());
        assert_eq!(read.request.evalscript(), plan.request.evalscript());
    }
}
