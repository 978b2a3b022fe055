use crate::image_request::{MosaickingOrder, ProcessOptions};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml;
use url::Url;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub service: Service,
    pub request: Request,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Service {
    pub auth_url: Url,
    pub catalog_url: Url,
    pub process_url: Url,
    pub page_limit: u32,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Request {
    pub collection: String,
    pub resolution: f64,
    pub max_dimension: u32,
    pub mosaicking_order: MosaickingOrder,
    pub max_cloud_coverage: Option<f64>,
}

pub fn settings_toml() -> toml::Table {
    toml::toml! {
        output_dir = "data"

        [service]
        auth_url = "https://services.sentinel-hub.com/auth/realms/main/protocol/openid-connect/token"
        catalog_url = "https://services.sentinel-hub.com/api/v1/catalog/1.0.0/search"
        process_url = "https://services.sentinel-hub.com/api/v1/process"
        // The catalog caps pages at 100 features
        page_limit = 100

        [request]
        collection = "sentinel-2-l2a"
        resolution = 10.0
        max_dimension = 2500
        mosaicking_order = "leastCC"
    }
}

impl Settings {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Self {
        let settings: Self =
            toml::from_str(&table.to_string()).expect("Error deserializing settings template");
        settings
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            data_collection: self.request.collection.clone(),
            mosaicking_order: self.request.mosaicking_order,
            max_cloud_coverage: self.request.max_cloud_coverage,
            resolution: self.request.resolution,
            max_dimension: self.request.max_dimension,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_template(&settings_toml())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template() {
        let settings = Settings::from_template(&settings_toml());
        assert_eq!(settings.request.collection, "sentinel-2-l2a");
        assert_eq!(settings.request.max_dimension, 2500);
        assert_eq!(settings.request.max_cloud_coverage, None);
        assert_eq!(settings.process_options(), ProcessOptions::default());
    }

    #[test]
    fn test_template_matches_default() {
        let settings = Settings::from_template(&settings_toml());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_write_read_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let settings = Settings::default();
        settings.write(&path).unwrap();

        let read = Settings::read(&path).unwrap();
        assert_eq!(read, settings);
    }

    #[test]
    fn test_read_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut table = settings_toml();
        let request = table
            .get_mut("request")
            .and_then(|v| v.as_table_mut())
            .unwrap();
        request.insert("max_cloud_coverage".into(), toml::Value::Float(30.0));
        request.insert("mosaicking_order".into(), toml::Value::String("mostRecent".into()));
        fs::write(&path, table.to_string()).unwrap();

        let settings = Settings::read(&path).unwrap();
        let options = settings.process_options();
        assert_eq!(options.max_cloud_coverage, Some(30.0));
        assert_eq!(options.mosaicking_order, MosaickingOrder::MostRecent);
    }
}
