#![allow(async_fn_in_trait)]
pub mod area;
pub mod catalog;
pub mod download;
pub mod error;
pub mod evalscript;
pub mod image_request;
pub mod pipeline;
pub mod scene;
pub mod sentinel_hub;
pub mod settings;
pub mod utm;

pub use error::{Error, Result};
