use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{FULL_DATASET_BBOX, JSONLD_HREF, TILING_PIXEL_SIZE};
use crate::error::LandcoverError;

pub const DEFAULT_CONFIG_FILE: &str = "nrcan-landcover.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub metadata_url: Option<String>,
    #[serde(default)]
    pub tile_size: Option<TileSizeEntry>,
    #[serde(default)]
    pub retile_program: Option<String>,
    #[serde(default)]
    pub translate_program: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub full_bbox: Option<[f64; 4]>,
    /// Schema-validate Items and Collections before writing them.
    #[serde(default)]
    pub validate_stac: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TileSizeEntry {
    Square(u32),
    Detailed { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub metadata_url: String,
    pub tile_size: (u32, u32),
    pub retile_program: String,
    pub translate_program: String,
    pub http_timeout_secs: u64,
    pub full_bbox: [f64; 4],
    pub validate_stac: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; the default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, LandcoverError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| LandcoverError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| LandcoverError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let tile_size = match config.tile_size {
            Some(TileSizeEntry::Square(size)) => (size, size),
            Some(TileSizeEntry::Detailed { width, height }) => (width, height),
            None => TILING_PIXEL_SIZE,
        };

        ResolvedConfig {
            metadata_url: config
                .metadata_url
                .unwrap_or_else(|| JSONLD_HREF.to_string()),
            tile_size,
            retile_program: config
                .retile_program
                .unwrap_or_else(|| "gdal_retile.py".to_string()),
            translate_program: config
                .translate_program
                .unwrap_or_else(|| "gdal_translate".to_string()),
            http_timeout_secs: config.http_timeout_secs.unwrap_or(600),
            full_bbox: config.full_bbox.unwrap_or(FULL_DATASET_BBOX),
            validate_stac: config.validate_stac.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.metadata_url, JSONLD_HREF);
        assert_eq!(resolved.tile_size, TILING_PIXEL_SIZE);
        assert_eq!(resolved.translate_program, "gdal_translate");
        assert_eq!(resolved.full_bbox, FULL_DATASET_BBOX);
        assert!(resolved.validate_stac);
    }

    #[test]
    fn parse_square_tile_size() {
        let config: Config = serde_json::from_str(r#"{"tile_size": 256}"#).unwrap();
        let resolved = ConfigLoader::resolve_config(config);
        assert_eq!(resolved.tile_size, (256, 256));
    }
}
