//! Output styles and the fixed evalscripts that render them on the service
//! side.
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputStyle {
    TrueColor,
    VegetationIndex,
}

/// A pixel-shading script together with the number of bands it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evalscript {
    pub source: &'static str,
    pub bands: u8,
}

impl OutputStyle {
    pub fn evalscript(&self) -> Evalscript {
        match self {
            Self::TrueColor => Evalscript {
                source: TRUE_COLOR,
                bands: 3,
            },
            Self::VegetationIndex => Evalscript {
                source: NDVI,
                bands: 4,
            },
        }
    }

    /// Short name used on the command line and in file names.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TrueColor => "visual",
            Self::VegetationIndex => "ndvi",
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for OutputStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "visual" | "true-color" => Ok(Self::TrueColor),
            "ndvi" | "vegetation-index" => Ok(Self::VegetationIndex),
            _ => Err(Error::InvalidStyle(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    Png,
    Tiff,
}

impl OutputEncoding {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tiff => "tiff",
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "tiff" | "tif" => Ok(Self::Tiff),
            _ => Err(Error::InvalidEncoding(s.to_string())),
        }
    }
}

const TRUE_COLOR: &str = r#"//VERSION=3

function setup() {
    return {
        input: [{
            bands: ["B02", "B03", "B04"]
        }],
        output: {
            bands: 3
        }
    };
}

function evaluatePixel(sample) {
    return [sample.B04, sample.B03, sample.B02];
}
"#;

const NDVI: &str = r#"//VERSION=3

function setup() {
    return {
        input: [{
            bands: ["B04", "B08", "dataMask"]
        }],
        output: {
            bands: 4
        }
    };
}

function evaluatePixel(sample) {
    let val = (sample.B08 - sample.B04) / (sample.B08 + sample.B04);
    let imgVals = null;

    if (val < -1.1) imgVals = [0, 0, 0];
    else if (val < -0.2) imgVals = [0.75, 0.75, 0.75];
    else if (val < -0.1) imgVals = [0.86, 0.86, 0.86];
    else if (val < 0) imgVals = [1, 1, 0.88];
    else if (val < 0.025) imgVals = [1, 0.98, 0.8];
    else if (val < 0.05) imgVals = [0.93, 0.91, 0.71];
    else if (val < 0.075) imgVals = [0.87, 0.85, 0.61];
    else if (val < 0.1) imgVals = [0.8, 0.78, 0.51];
    else if (val < 0.125) imgVals = [0.74, 0.72, 0.42];
    else if (val < 0.15) imgVals = [0.69, 0.76, 0.38];
    else if (val < 0.175) imgVals = [0.64, 0.8, 0.35];
    else if (val < 0.2) imgVals = [0.57, 0.75, 0.32];
    else if (val < 0.25) imgVals = [0.5, 0.7, 0.28];
    else if (val < 0.3) imgVals = [0.44, 0.64, 0.25];
    else if (val < 0.35) imgVals = [0.38, 0.59, 0.21];
    else if (val < 0.4) imgVals = [0.31, 0.54, 0.18];
    else if (val < 0.45) imgVals = [0.25, 0.49, 0.14];
    else if (val < 0.5) imgVals = [0.19, 0.43, 0.11];
    else if (val < 0.55) imgVals = [0.13, 0.38, 0.07];
    else if (val < 0.6) imgVals = [0.06, 0.33, 0.04];
    else imgVals = [0, 0.27, 0];

    imgVals.push(sample.dataMask);

    return imgVals;
}
"#;
