use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => write!(f, "width"),
            Self::Height => write!(f, "height"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Requested image {axis} is too large ({pixels} px, limit is {limit} px)")]
    InvalidDimensions { axis: Axis, pixels: u32, limit: u32 },

    #[error("Output type `{0}` not one of (visual, ndvi)")]
    InvalidStyle(String),

    #[error("Output format `{0}` not one of (png, tiff)")]
    InvalidEncoding(String),

    #[error("Authentication rejected: {0}")]
    Authentication(String),

    #[error("Service responded with {status}: {message}")]
    Service { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}
