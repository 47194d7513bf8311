use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::cog::{self, CogConverter, CogOptions};
use crate::config::ResolvedConfig;
use crate::error::LandcoverError;
use crate::extent;
use crate::fs_util;
use crate::metadata::{self, SourceMetadata};
use crate::opendata::OpenDataClient;
use crate::process::ProcessRunner;
use crate::stac::{self, ItemSource, LandcoverItem};

pub const EXTENT_ASSET_FILE: &str = "nrcan-landcover-extent.geojson";

#[derive(Debug, Clone, Copy, Default)]
pub struct CogRequest {
    pub tile: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionResult {
    pub id: String,
    pub path: String,
    pub items: Vec<ItemResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CogResult {
    pub dry_run: bool,
    pub tiled: bool,
    pub cogs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub id: String,
    pub path: String,
    pub tiled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtentAssetResult {
    pub path: String,
}

pub struct App<C: OpenDataClient, R: ProcessRunner> {
    config: ResolvedConfig,
    client: C,
    runner: R,
}

impl<C: OpenDataClient, R: ProcessRunner> App<C, R> {
    pub fn new(config: ResolvedConfig, client: C, runner: R) -> Self {
        Self {
            config,
            client,
            runner,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Metadata from `source`, or from the configured portal URL.
    pub fn metadata(&self, source: Option<&str>) -> Result<SourceMetadata, LandcoverError> {
        let source = source.unwrap_or(&self.config.metadata_url);
        metadata::get_metadata(source, &self.client)
    }

    pub fn create_collection(
        &self,
        metadata_source: Option<&str>,
        destination: &Path,
    ) -> Result<CollectionResult, LandcoverError> {
        let destination = destination_dir(destination)?;
        let metadata = self.metadata(metadata_source)?;

        let mut collection = stac::create_collection(&metadata)?;
        if self.config.validate_stac {
            stac::validate_collection(&collection)?;
        }
        let path = stac::write_collection(&mut collection, &mut [], destination.as_std_path())?;
        Ok(CollectionResult {
            id: collection.id,
            path: display(&path),
            items: Vec::new(),
        })
    }

    /// Convert a local GeoTIFF, or the published package when `source` is absent.
    pub fn create_cog(
        &self,
        metadata_source: Option<&str>,
        destination: &Path,
        source: Option<&Path>,
        request: CogRequest,
    ) -> Result<CogResult, LandcoverError> {
        let destination = destination_dir(destination)?;
        let converter = CogConverter::new(
            &self.runner,
            &self.config,
            CogOptions {
                raise_on_fail: true,
                dry_run: request.dry_run,
            },
        );
        let output_dir = destination.as_std_path();

        let cogs = match source {
            Some(source) if request.tile => converter.create_retiled_cogs(source, output_dir)?,
            Some(source) => {
                let output = cog::cog_output_path(source, output_dir);
                vec![converter.create_cog(source, &output)?]
            }
            None => {
                let metadata = self.metadata(metadata_source)?;
                converter.download_create_cog(&metadata, &self.client, output_dir, request.tile)?
            }
        };

        info!(count = cogs.len(), "COG conversion finished");
        Ok(CogResult {
            dry_run: request.dry_run,
            tiled: request.tile,
            cogs: cogs.iter().map(|path| display(path)).collect(),
        })
    }

    pub fn create_item(
        &self,
        metadata_source: Option<&str>,
        destination: &Path,
        cog: Option<&Path>,
        extent_asset: Option<&Path>,
    ) -> Result<ItemResult, LandcoverError> {
        let destination = destination_dir(destination)?;
        let metadata = self.metadata(metadata_source)?;
        let LandcoverItem { mut item, tiled } = stac::create_item(ItemSource {
            metadata: &metadata,
            cog,
            extent_asset,
            full_bbox: &self.config.full_bbox,
        })?;
        if self.config.validate_stac {
            stac::validate_item(&item)?;
        }
        let path = stac::write_item(&mut item, destination.as_std_path())?;
        Ok(ItemResult {
            id: item.id,
            path: display(&path),
            tiled,
        })
    }

    pub fn create_extent_asset(
        &self,
        metadata_source: Option<&str>,
        destination: &Path,
    ) -> Result<ExtentAssetResult, LandcoverError> {
        let destination = destination_dir(destination)?;
        let metadata = self.metadata(metadata_source)?;
        let path = destination.join(EXTENT_ASSET_FILE);
        extent::create_extent_asset(&metadata, path.as_std_path())?;
        info!(path = %path, "wrote extent asset");
        Ok(ExtentAssetResult {
            path: path.to_string(),
        })
    }

    /// Download, convert, and catalog the whole product into `destination`.
    pub fn build_full_collection(
        &self,
        metadata_source: Option<&str>,
        destination: &Path,
        tile: bool,
    ) -> Result<CollectionResult, LandcoverError> {
        let destination = destination_dir(destination)?;
        let metadata = self.metadata(metadata_source)?;

        let extent_path = destination.join(EXTENT_ASSET_FILE);
        extent::create_extent_asset(&metadata, extent_path.as_std_path())?;

        let converter = CogConverter::new(&self.runner, &self.config, CogOptions::default());
        let cogs =
            converter.download_create_cog(&metadata, &self.client, destination.as_std_path(), tile)?;
        if cogs.is_empty() {
            warn!("no COGs were produced, the collection will have no items");
        }

        let created = cogs
            .iter()
            .map(|cog| {
                let created = stac::create_item(ItemSource {
                    metadata: &metadata,
                    cog: Some(cog),
                    extent_asset: Some(extent_path.as_std_path()),
                    full_bbox: &self.config.full_bbox,
                })?;
                if self.config.validate_stac {
                    stac::validate_item(&created.item)?;
                }
                Ok(created)
            })
            .collect::<Result<Vec<LandcoverItem>, LandcoverError>>()?;
        let tiled = created.iter().map(|created| created.tiled).collect::<Vec<_>>();
        let mut items = created
            .into_iter()
            .map(|created| created.item)
            .collect::<Vec<_>>();

        let mut collection = stac::create_collection(&metadata)?;
        if self.config.validate_stac {
            stac::validate_collection(&collection)?;
        }
        let path = stac::write_collection(&mut collection, &mut items, destination.as_std_path())?;

        let items = items
            .iter()
            .zip(tiled)
            .map(|(item, tiled)| ItemResult {
                id: item.id.clone(),
                path: destination
                    .join(&item.id)
                    .join(format!("{}.json", item.id))
                    .to_string(),
                tiled,
            })
            .collect();
        Ok(CollectionResult {
            id: collection.id,
            path: display(&path),
            items,
        })
    }
}

/// The destination must already exist; its path ends up in STAC hrefs so it must be UTF-8.
fn destination_dir(destination: &Path) -> Result<Utf8PathBuf, LandcoverError> {
    fs_util::ensure_dir_exists(destination)?;
    Utf8PathBuf::from_path_buf(PathBuf::from(destination)).map_err(|path| {
        LandcoverError::Filesystem(format!("non UTF-8 destination: {}", path.display()))
    })
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
