//! Area and time of interest, validated before anything touches the network.
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", try_from = "[f64; 4]")]
pub struct GeoBoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        for lon in [west, east] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(Error::Validation(format!(
                    "Longitude {lon} outside of [-180, 180]"
                )));
            }
        }
        for lat in [south, north] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(Error::Validation(format!(
                    "Latitude {lat} outside of [-90, 90]"
                )));
            }
        }
        if west >= east {
            return Err(Error::Validation(format!(
                "West edge {west} must be smaller than east edge {east}"
            )));
        }
        if south >= north {
            return Err(Error::Validation(format!(
                "South edge {south} must be smaller than north edge {north}"
            )));
        }
        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Center point as (lon, lat).
    pub fn middle(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }
}

impl From<GeoBoundingBox> for [f64; 4] {
    fn from(bbox: GeoBoundingBox) -> Self {
        bbox.as_array()
    }
}

impl TryFrom<[f64; 4]> for GeoBoundingBox {
    type Error = Error;

    fn try_from([west, south, east, north]: [f64; 4]) -> Result<Self> {
        Self::new(west, south, east, north)
    }
}

impl FromStr for GeoBoundingBox {
    type Err = Error;

    /// Parses `x1,y1,x2,y2` in degrees.
    fn from_str(s: &str) -> Result<Self> {
        let coords = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Validation(format!("Invalid coordinate in `{s}`: {e}")))?;

        let coords: [f64; 4] = coords.try_into().map_err(|c: Vec<f64>| {
            Error::Validation(format!("Expected 4 coordinates, got {}", c.len()))
        })?;
        Self::try_from(coords)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeInterval {
    pub fn new(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_date(start)?,
            end: parse_date(end)?,
        })
    }

    /// Catalog `datetime` range. The end date covers the whole day.
    pub fn to_rfc3339_range(&self) -> String {
        format!(
            "{}T00:00:00Z/{}T23:59:59Z",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl FromStr for TimeInterval {
    type Err = Error;

    /// Parses `start,end` ISO dates.
    fn from_str(s: &str) -> Result<Self> {
        match s.split(',').map(str::trim).collect::<Vec<_>>().as_slice() {
            [start, end] => Self::new(start, end),
            parts => Err(Error::Validation(format!(
                "Expected 2 dates, got {}",
                parts.len()
            ))),
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("Invalid date `{value}`: {e}")))
}
